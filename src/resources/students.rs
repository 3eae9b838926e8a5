use super::keys::{DASHBOARD_OVERVIEW, RECENT_ACTIVITIES, STUDENT, STUDENTS};
use super::Gym;
use crate::api::types::{Student, StudentEnvelope, StudentInput, StudentList};
use crate::api::{ApiClient, ApiError};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

impl ApiClient {
  pub async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
    let list: Option<StudentList> = self.get("/students", &Vec::new()).await?;
    Ok(list.unwrap_or_default().students)
  }

  pub async fn get_student(&self, id: &str) -> Result<Student, ApiError> {
    let envelope: Option<StudentEnvelope> = self.get(&format!("/students/{}", id), &Vec::new()).await?;
    envelope
      .and_then(|e| e.student)
      .ok_or_else(|| ApiError::Http {
        status: 404,
        message: Some("Aluno não encontrado".to_string()),
      })
  }

  pub async fn create_student(&self, input: &StudentInput) -> Result<StudentEnvelope, ApiError> {
    self.post("/students", input).await
  }

  pub async fn update_student(
    &self,
    id: &str,
    input: &StudentInput,
  ) -> Result<StudentEnvelope, ApiError> {
    self.put(&format!("/students/{}", id), input).await
  }
}

pub fn students_key() -> QueryKey {
  QueryKey::new(STUDENTS)
}

pub fn student_key(id: &str) -> QueryKey {
  QueryKey::new(STUDENT).with("id", id)
}

fn write_descriptor(name: &'static str, success: &str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([
      QueryKey::new(STUDENTS),
      QueryKey::new(STUDENT),
      QueryKey::new(DASHBOARD_OVERVIEW),
      QueryKey::new(RECENT_ACTIVITIES),
    ])
    .with_success(success)
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor("create-student", "Aluno criado com sucesso.", "Erro ao criar aluno.")
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor(
    "update-student",
    "Aluno atualizado com sucesso.",
    "Erro ao atualizar aluno.",
  )
}

impl Gym {
  pub fn students(&self) -> Query<Vec<Student>> {
    self.query(students_key(), QueryPolicy::DEFAULT, |api| async move {
      api.list_students().await
    })
  }

  pub fn student(&self, id: &str) -> Query<Student> {
    let id = id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!id.is_empty());
    self.query(student_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.get_student(&id).await }
    })
  }

  pub fn create_student(&self) -> Mutation<StudentInput, StudentEnvelope> {
    self.mutation(create_descriptor(), |api, input: StudentInput| async move {
      api.create_student(&input).await
    })
  }

  pub fn update_student(&self) -> Mutation<(String, StudentInput), StudentEnvelope> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, StudentInput)| async move { api.update_student(&id, &input).await },
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::gym;

  #[tokio::test]
  async fn test_missing_student_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/students/s9")
      .with_body(r#"{"student":null}"#)
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let err = gym.api.get_student("s9").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(""), "Aluno não encontrado");
  }

  #[tokio::test]
  async fn test_create_posts_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/students")
      .match_body(mockito::Matcher::PartialJson(serde_json::json!({
        "name": "Ana", "email": "ana@gym.com"
      })))
      .with_status(201)
      .with_body(r#"{"student":{"id":"s1","name":"Ana","email":"ana@gym.com"},"message":"ok"}"#)
      .create_async()
      .await;

    let (gym, mut toasts) = gym(&server.url());
    let input = StudentInput {
      name: "Ana".to_string(),
      email: "ana@gym.com".to_string(),
      ..Default::default()
    };
    let created = gym.create_student().mutate_async(input).await.unwrap();

    assert_eq!(created.student.unwrap().id, "s1");
    assert_eq!(toasts.drain()[0].message, "Aluno criado com sucesso.");
    mock.assert_async().await;
  }

  #[test]
  fn test_descriptor_covers_detail() {
    let keys = update_descriptor();
    assert!(keys.invalidates().iter().any(|k| k.matches(&student_key("s1"))));
  }

  #[test]
  fn test_writes_refresh_dashboard() {
    let expected = vec![
      QueryKey::new(STUDENTS),
      QueryKey::new(STUDENT),
      QueryKey::new(DASHBOARD_OVERVIEW),
      QueryKey::new(RECENT_ACTIVITIES),
    ];
    for descriptor in [create_descriptor(), update_descriptor()] {
      assert_eq!(descriptor.invalidates(), expected.as_slice());
    }
  }
}
