//! End-to-end behavior of the data layer against a mock backend.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use gymcrm::api::types::{CreatePayment, PaymentType, PlanStatus, Student, StudentInput};
use gymcrm::api::ApiClient;
use gymcrm::filter::ListFilter;
use gymcrm::query::{MemoryCache, Query, QueryClient};
use gymcrm::resources::payments::{PaymentFilters, StatsRange};
use gymcrm::resources::workout_plans::WorkoutPlanFilters;
use gymcrm::resources::Gym;
use gymcrm::storage::MemoryCredentials;
use gymcrm::toast::{ToastLevel, ToastQueue, Toasts};
use mockito::Server;
use serde_json::json;

fn gym_with_gc(url: &str, gc_time: Duration) -> (Gym, ToastQueue) {
  let creds = Arc::new(MemoryCredentials::new(Some("token".to_string())));
  let api = ApiClient::new(url, creds).unwrap();
  let queries = QueryClient::new(Arc::new(MemoryCache::new()), gc_time);
  let (toasts, queue) = Toasts::channel();
  (Gym::new(api, queries, toasts), queue)
}

fn gym(url: &str) -> (Gym, ToastQueue) {
  gym_with_gc(url, Duration::from_secs(300))
}

async fn settle<T: Any + Send + Sync>(query: &mut Query<T>) {
  for _ in 0..200 {
    query.poll();
    if !query.is_fetching() && (query.data().is_some() || query.is_error()) {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("query never settled: {:?}", query.key());
}

fn student(id: usize, name: &str) -> serde_json::Value {
  json!({"id": id.to_string(), "name": name, "email": format!("aluno{}@gym.com", id), "status": "ACTIVE"})
}

#[tokio::test]
async fn test_empty_collection_is_empty_data() {
  let mut server = Server::new_async().await;
  server
    .mock("GET", "/students")
    .with_body(json!({"students": []}).to_string())
    .create_async()
    .await;

  let (gym, _toasts) = gym(&server.url());
  let mut students = gym.students();
  students.fetch();
  settle(&mut students).await;

  assert_eq!(students.data().map(Vec::len), Some(0));
  assert!(!students.is_error());
}

#[tokio::test]
async fn test_identical_reads_share_one_request() {
  let mut server = Server::new_async().await;
  let list = server
    .mock("GET", "/students")
    .with_body(json!({"students": [student(1, "Ana")]}).to_string())
    .expect(1)
    .create_async()
    .await;

  let (gym, _toasts) = gym(&server.url());
  let mut first = gym.students();
  let mut second = gym.students();
  first.fetch();
  second.fetch();
  settle(&mut first).await;
  settle(&mut second).await;

  assert_eq!(first.data(), second.data());
  assert_eq!(first.data().map(|s| s[0].name.as_str()), Some("Ana"));
  list.assert_async().await;
}

#[tokio::test]
async fn test_create_payment_refetches_list_and_stats() {
  let mut server = Server::new_async().await;
  let list = server
    .mock("GET", "/payments")
    .with_body(json!({"payments": []}).to_string())
    .expect(2)
    .create_async()
    .await;
  let stats = server
    .mock("GET", "/payments/stats/overview")
    .with_body(json!({"revenue": {"total": 0.0}}).to_string())
    .expect(2)
    .create_async()
    .await;
  server
    .mock("POST", "/payments")
    .with_status(201)
    .with_body(json!({"payment": {"id": "p1", "amount": 150.0, "dueDate": "2025-04-10"}}).to_string())
    .create_async()
    .await;

  let (gym, mut toasts) = gym(&server.url());
  let mut payments = gym.payments(PaymentFilters::default());
  let mut overview = gym.payment_stats(StatsRange::default());
  payments.fetch();
  overview.fetch();
  settle(&mut payments).await;
  settle(&mut overview).await;

  let create = gym.create_payment();
  let created = create
    .mutate_async(CreatePayment {
      student_id: "s1".to_string(),
      amount: 150.0,
      due_date: "2025-04-10".to_string(),
      description: None,
      kind: PaymentType::Monthly,
    })
    .await
    .unwrap();
  assert_eq!(created.payment.id, "p1");

  for _ in 0..200 {
    payments.poll();
    overview.poll();
    if list.matched_async().await && stats.matched_async().await {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  list.assert_async().await;
  stats.assert_async().await;

  let shown = toasts.drain();
  assert!(shown
    .iter()
    .any(|t| t.level == ToastLevel::Success && t.message == "Pagamento criado com sucesso!"));
}

#[tokio::test]
async fn test_failed_mutation_keeps_cached_list() {
  let mut server = Server::new_async().await;
  let list = server
    .mock("GET", "/students")
    .with_body(json!({"students": [student(1, "Ana")]}).to_string())
    .expect(1)
    .create_async()
    .await;
  server
    .mock("POST", "/students")
    .with_status(400)
    .with_body(r#"{"message":"Email já cadastrado"}"#)
    .create_async()
    .await;

  let (gym, mut toasts) = gym(&server.url());
  let mut students = gym.students();
  students.fetch();
  settle(&mut students).await;

  let create = gym.create_student();
  let result = create
    .mutate_async(StudentInput {
      name: "Bruno".to_string(),
      email: "ana@gym.com".to_string(),
      ..Default::default()
    })
    .await;
  assert!(result.is_err());

  for _ in 0..10 {
    students.poll();
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert!(!students.is_fetching());
  assert_eq!(students.data().map(Vec::len), Some(1));
  list.assert_async().await;

  let shown = toasts.drain();
  assert_eq!(shown.len(), 1);
  assert_eq!(shown[0].level, ToastLevel::Error);
  assert_eq!(shown[0].message, "Email já cadastrado");
}

#[tokio::test]
async fn test_search_narrows_cached_students_without_requests() {
  let mut server = Server::new_async().await;
  let names = [
    "Ana Silva",
    "Bruno Costa",
    "Carla Souza",
    "Diego Lima",
    "Elisa Rocha",
    "Fábio Silva",
    "Gabriela Alves",
    "Hugo Pereira",
    "Iara Gomes",
    "João Martins",
  ];
  let body: Vec<_> = names
    .iter()
    .enumerate()
    .map(|(i, name)| student(i + 1, name))
    .collect();
  let list = server
    .mock("GET", "/students")
    .with_body(json!({ "students": body }).to_string())
    .expect(1)
    .create_async()
    .await;

  let (gym, _toasts) = gym(&server.url());
  let mut students = gym.students();
  students.fetch();
  settle(&mut students).await;

  let filter = ListFilter {
    search: "silva".to_string(),
    ..Default::default()
  };
  let all: &[Student] = students.data().map(Vec::as_slice).unwrap_or(&[]);
  let found: Vec<&str> = filter.apply(all).iter().map(|s| s.name.as_str()).collect();
  assert_eq!(found, vec!["Ana Silva", "Fábio Silva"]);

  list.assert_async().await;
}

#[tokio::test]
async fn test_toggle_plan_flips_status_in_refetched_list() {
  let mut server = Server::new_async().await;
  let plan = |status: &str| json!({"id": "w1", "name": "Hipertrofia", "status": status});
  let before = server
    .mock("GET", "/workout-plans")
    .with_body(json!({"workoutPlans": [plan("ACTIVE")]}).to_string())
    .expect(1)
    .create_async()
    .await;
  server
    .mock("PATCH", "/workout-plans/w1/toggle-active")
    .with_body(json!({"workoutPlan": plan("PAUSED")}).to_string())
    .create_async()
    .await;

  let (gym, _toasts) = gym(&server.url());
  let mut plans = gym.workout_plans(WorkoutPlanFilters::default());
  plans.fetch();
  settle(&mut plans).await;
  assert_eq!(plans.data().map(|p| p[0].status), Some(PlanStatus::Active));

  before.remove_async().await;
  let after = server
    .mock("GET", "/workout-plans")
    .with_body(json!({"workoutPlans": [plan("PAUSED")]}).to_string())
    .expect(1)
    .create_async()
    .await;

  let toggled = gym.toggle_workout_plan().mutate_async("w1".to_string()).await.unwrap();
  assert_eq!(toggled.status, PlanStatus::Paused);

  for _ in 0..200 {
    plans.poll();
    if after.matched_async().await {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  settle(&mut plans).await;

  assert_eq!(plans.data().map(|p| p[0].status), Some(PlanStatus::Paused));
  after.assert_async().await;
}

#[tokio::test]
async fn test_unobserved_entries_are_collected() {
  let mut server = Server::new_async().await;
  server
    .mock("GET", "/students")
    .with_body(json!({"students": [student(1, "Ana")]}).to_string())
    .create_async()
    .await;

  let (gym, _toasts) = gym_with_gc(&server.url(), Duration::ZERO);
  let mut students = gym.students();
  students.fetch();
  settle(&mut students).await;
  let key = students.key().clone();

  // Still observed, so it stays
  assert_eq!(gym.queries.collect_garbage(), 0);
  assert!(gym.queries.get_data::<Vec<Student>>(&key).is_some());

  drop(students);
  assert_eq!(gym.queries.collect_garbage(), 1);
  assert!(gym.queries.get_data::<Vec<Student>>(&key).is_none());
}
