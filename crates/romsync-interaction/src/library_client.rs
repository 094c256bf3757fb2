//! HTTP client for the game library backend.
//!
//! Implements the cheat, cheat file, cheat type and artifact services over
//! the backend's REST API.
//! Every request carries the bearer token when one is configured.

use crate::dto::{ArtifactRecordDto, CheatCodeBody, CheatCodeDto, CheatFileDto, CheatTypeDto};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use romsync_core::RomsyncError;
use romsync_core::artifact::{ArtifactKind, ArtifactRecord, ArtifactService, PushRequest};
use romsync_core::cheat::{
    CheatCode, CheatDraft, CheatFile, CheatFileService, CheatFileUpload, CheatService, CheatType,
    CheatTypeSource,
};
use romsync_core::config::ApiConfig;
use romsync_core::error::Result;

const OCTET_STREAM: &str = "application/octet-stream";

/// REST client shared by the cheat and artifact adapters.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl LibraryClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RomsyncError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a server path (or an absolute URL) against the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn cheats_url(&self, rom_id: i64) -> String {
        self.url(&format!("/api/roms/{}/cheats", rom_id))
    }

    fn cheat_url(&self, rom_id: i64, cheat_id: i64) -> String {
        self.url(&format!("/api/roms/{}/cheats/{}", rom_id, cheat_id))
    }

    fn cheat_files_url(&self, rom_id: i64) -> String {
        self.url(&format!("/api/roms/{}/cheats/files", rom_id))
    }

    fn cheat_file_url(&self, rom_id: i64, file_id: i64) -> String {
        self.url(&format!("/api/roms/{}/cheats/files/{}", rom_id, file_id))
    }

    fn cheat_type_url(&self, type_id: Option<&str>) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.url("/api/cheat_types"))
            .map_err(|e| RomsyncError::config(format!("Invalid API base URL: {}", e)))?;
        if let Some(type_id) = type_id {
            url.path_segments_mut()
                .map_err(|_| RomsyncError::config("API base URL cannot carry a path"))?
                .push(type_id);
        }
        Ok(url.into())
    }

    /// Upload endpoint: `POST` to the collection for new records, `PUT` to the
    /// record when one already exists.
    fn artifact_url(&self, kind: ArtifactKind, prior: Option<&ArtifactRecord>) -> String {
        match prior {
            Some(record) => self.url(&format!("/api/{}/{}", kind.collection(), record.id)),
            None => self.url(&format!("/api/{}", kind.collection())),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(what, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RomsyncError::network(
            Some(status.as_u16()),
            format!("{} failed ({}): {}", what, status, body.trim()),
        ))
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| RomsyncError::Serialization {
                format: "json".to_string(),
                message: format!("{}: {}", what, e),
            })
    }
}

fn transport_error(what: &str, err: reqwest::Error) -> RomsyncError {
    RomsyncError::network(
        err.status().map(|s| s.as_u16()),
        format!("{} failed: {}", what, err),
    )
}

/// Form fields of a cheat file upload.
fn cheat_file_form(upload: &CheatFileUpload) -> Form {
    Form::new()
        .text("file_name", upload.file_name.clone())
        .text("file_size", upload.file_size().to_string())
        .text("file_content", upload.content.clone())
}

/// Builds the multipart form for an artifact upload.
fn artifact_form(request: &PushRequest<'_>) -> Result<Form> {
    let blob = Part::bytes(request.artifact.data.clone())
        .file_name(request.file_name.to_string())
        .mime_str(OCTET_STREAM)
        .map_err(|e| RomsyncError::internal(format!("Invalid upload part: {}", e)))?;

    let mut form = Form::new().part(request.kind.upload_field(), blob);

    if let Some(screenshot) = &request.artifact.screenshot {
        let shot = Part::bytes(screenshot.clone())
            .file_name(screenshot_name(request.file_name))
            .mime_str("image/png")
            .map_err(|e| RomsyncError::internal(format!("Invalid screenshot part: {}", e)))?;
        form = form.part("screenshotFile", shot);
    }

    Ok(form)
}

fn screenshot_name(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    format!("{}.png", stem)
}

#[async_trait]
impl CheatService for LibraryClient {
    async fn list(&self, rom_id: i64) -> Result<Vec<CheatCode>> {
        let what = format!("List cheats for rom {}", rom_id);
        let response = self.send(self.client.get(self.cheats_url(rom_id)), &what).await?;
        let dtos: Vec<CheatCodeDto> = Self::json(response, &what).await?;

        tracing::debug!("[LibraryClient] {} cheats for rom {}", dtos.len(), rom_id);
        Ok(dtos.into_iter().map(|dto| dto.into_domain(rom_id)).collect())
    }

    async fn create(&self, rom_id: i64, draft: &CheatDraft) -> Result<CheatCode> {
        let what = format!("Create cheat for rom {}", rom_id);
        let request = self
            .client
            .post(self.cheats_url(rom_id))
            .json(&CheatCodeBody::from(draft));
        let response = self.send(request, &what).await?;
        let dto: CheatCodeDto = Self::json(response, &what).await?;
        Ok(dto.into_domain(rom_id))
    }

    async fn update(&self, rom_id: i64, cheat_id: i64, draft: &CheatDraft) -> Result<CheatCode> {
        let what = format!("Update cheat {} for rom {}", cheat_id, rom_id);
        let request = self
            .client
            .put(self.cheat_url(rom_id, cheat_id))
            .json(&CheatCodeBody::from(draft));
        let response = self.send(request, &what).await?;
        let dto: CheatCodeDto = Self::json(response, &what).await?;
        Ok(dto.into_domain(rom_id))
    }

    async fn delete(&self, rom_id: i64, cheat_id: i64) -> Result<()> {
        let what = format!("Delete cheat {} for rom {}", cheat_id, rom_id);
        self.send(self.client.delete(self.cheat_url(rom_id, cheat_id)), &what)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CheatFileService for LibraryClient {
    async fn list_files(&self, rom_id: i64) -> Result<Vec<CheatFile>> {
        let what = format!("List cheat files for rom {}", rom_id);
        let response = self
            .send(self.client.get(self.cheat_files_url(rom_id)), &what)
            .await?;
        let dtos: Vec<CheatFileDto> = Self::json(response, &what).await?;
        Ok(dtos.into_iter().map(|dto| dto.into_domain(rom_id)).collect())
    }

    async fn upload_file(&self, rom_id: i64, upload: &CheatFileUpload) -> Result<CheatFile> {
        let what = format!("Upload cheat file {} for rom {}", upload.file_name, rom_id);
        let request = self
            .client
            .post(self.cheat_files_url(rom_id))
            .multipart(cheat_file_form(upload));
        let response = self.send(request, &what).await?;
        let dto: CheatFileDto = Self::json(response, &what).await?;

        tracing::info!(
            "[LibraryClient] Stored cheat file {} ({} bytes) for rom {}",
            dto.file_name,
            dto.file_size,
            rom_id
        );
        Ok(dto.into_domain(rom_id))
    }

    async fn delete_file(&self, rom_id: i64, file_id: i64) -> Result<()> {
        let what = format!("Delete cheat file {} for rom {}", file_id, rom_id);
        self.send(self.client.delete(self.cheat_file_url(rom_id, file_id)), &what)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CheatTypeSource for LibraryClient {
    async fn list_types(&self) -> Result<Vec<CheatType>> {
        let what = "List cheat types";
        let response = self.send(self.client.get(self.cheat_type_url(None)?), what).await?;
        let dtos: Vec<CheatTypeDto> = Self::json(response, what).await?;
        Ok(dtos.into_iter().map(|dto| dto.into_domain(None)).collect())
    }

    async fn get_type(&self, type_id: &str) -> Result<Option<CheatType>> {
        let what = format!("Get cheat type {}", type_id);
        let request = self.client.get(self.cheat_type_url(Some(type_id))?);
        let response = match self.send(request, &what).await {
            Ok(response) => response,
            Err(e) if e.http_status() == Some(StatusCode::NOT_FOUND.as_u16()) => return Ok(None),
            Err(e) => return Err(e),
        };
        let dto: CheatTypeDto = Self::json(response, &what).await?;
        Ok(Some(dto.into_domain(Some(type_id))))
    }
}

#[async_trait]
impl ArtifactService for LibraryClient {
    async fn fetch(&self, kind: ArtifactKind, record: &ArtifactRecord) -> Result<Option<Vec<u8>>> {
        let what = format!("Download {} {}", kind, record.id);
        let request = self.authorized(self.client.get(self.url(&record.download_path)));
        let response = request.send().await.map_err(|e| transport_error(&what, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("[LibraryClient] {} not stored (404)", what);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RomsyncError::network(
                Some(status.as_u16()),
                format!("{} failed ({}): {}", what, status, body.trim()),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| transport_error(&what, e))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }

    async fn push(&self, request: PushRequest<'_>) -> Result<ArtifactRecord> {
        let what = format!("Upload {} for rom {}", request.kind, request.rom_id);
        let url = self.artifact_url(request.kind, request.prior);
        let form = artifact_form(&request)?;

        let mut query: Vec<(&str, String)> = vec![("rom_id", request.rom_id.to_string())];
        if let Some(emulator) = request.emulator {
            query.push(("emulator", emulator.to_string()));
        }

        let builder = match request.prior {
            Some(_) => self.client.put(url),
            None => self.client.post(url),
        };
        let response = self
            .send(builder.query(&query).multipart(form), &what)
            .await?;
        let dto: ArtifactRecordDto = Self::json(response, &what).await?;

        tracing::info!(
            "[LibraryClient] Stored {} {} ({})",
            request.kind,
            dto.id,
            dto.file_name
        );
        Ok(dto.into())
    }
}
