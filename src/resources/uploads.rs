use reqwest::multipart::{Form, Part};

use super::Gym;
use crate::api::types::{UploadResponse, UploadedFile};
use crate::api::{ApiClient, ApiError};
use crate::forms::ValidationError;
use crate::imaging::{self, ImageError, PhotoFile};
use crate::query::{Mutation, MutationDescriptor};

fn invalid(err: ImageError) -> ApiError {
  ApiError::Validation(ValidationError::new("file", err.to_string()))
}

fn part(file: &PhotoFile) -> Result<Part, ApiError> {
  Ok(
    Part::bytes(file.bytes.clone())
      .file_name(file.name.clone())
      .mime_str(&file.mime)?,
  )
}

fn accepted(response: UploadResponse) -> Result<UploadResponse, ApiError> {
  if response.success {
    Ok(response)
  } else {
    Err(ApiError::Rejected(response.message))
  }
}

impl ApiClient {
  /// Upload one photo. Invalid files are rejected before any request.
  pub async fn upload_file(&self, file: &PhotoFile) -> Result<UploadedFile, ApiError> {
    imaging::validate_photo(&file.mime, file.size()).map_err(invalid)?;

    let form = Form::new().part("file", part(file)?);
    let response = accepted(self.post_multipart("/upload/single", form).await?)?;
    response
      .file
      .ok_or_else(|| ApiError::Decode("upload response has no file".to_string()))
  }

  pub async fn upload_files(&self, files: &[PhotoFile]) -> Result<Vec<UploadedFile>, ApiError> {
    imaging::validate_photos(files).map_err(invalid)?;

    let mut form = Form::new();
    for file in files {
      form = form.part("files", part(file)?);
    }
    let response = accepted(self.post_multipart("/upload/multiple", form).await?)?;
    Ok(response.files)
  }

  pub async fn delete_file(&self, name: &str) -> Result<(), ApiError> {
    let response: UploadResponse = self.delete(&format!("/upload/file/{}", name)).await?;
    accepted(response).map(|_| ())
  }

  /// Absolute URL for a stored file; full URLs pass through.
  pub fn file_url(&self, path: &str) -> Option<String> {
    if path.is_empty() {
      return None;
    }
    if path.starts_with("http") {
      return Some(path.to_string());
    }

    let origin = self.base_url().trim_end_matches("/api");
    Some(format!("{}/uploads/{}", origin, path.trim_start_matches('/')))
  }
}

pub fn upload_descriptor() -> MutationDescriptor {
  MutationDescriptor::new("upload-file", "Erro no upload")
}

pub fn delete_file_descriptor() -> MutationDescriptor {
  MutationDescriptor::new("delete-file", "Erro ao deletar arquivo")
    .with_success("Arquivo deletado com sucesso")
}

impl Gym {
  pub fn upload_file(&self) -> Mutation<PhotoFile, UploadedFile> {
    self.mutation(upload_descriptor(), |api, file: PhotoFile| async move {
      api.upload_file(&file).await
    })
  }

  pub fn upload_files(&self) -> Mutation<Vec<PhotoFile>, Vec<UploadedFile>> {
    self.mutation(upload_descriptor(), |api, files: Vec<PhotoFile>| async move {
      api.upload_files(&files).await
    })
  }

  pub fn delete_file(&self) -> Mutation<String, ()> {
    self.mutation(delete_file_descriptor(), |api, name: String| async move {
      api.delete_file(&name).await
    })
  }
}
