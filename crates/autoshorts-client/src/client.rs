//! Autoshorts API HTTP client.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use autoshorts_models::{Clip, GenerationRequest, Job, JobId, UserProfile};
use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::api::JobApi;
use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{ClientError, ClientResult};

/// Client for the generation API.
///
/// The credential is part of the client: every request carries it as a
/// bearer token when present and goes out unauthenticated otherwise.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    credential: Option<Credential>,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ClientConfig, credential: Option<Credential>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("autoshorts-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            config,
            credential,
        })
    }

    /// Create from environment variables, without a credential.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?, None)
    }

    /// Same client and connection pool, different credential.
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            credential,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /me`: profile of the account owning the credential.
    pub async fn me(&self) -> ClientResult<UserProfile> {
        let url = self.config.endpoint("me")?;
        self.send_json(self.request(Method::GET, url)).await
    }

    /// `POST /generate`.
    pub async fn start_generation(&self, request: &GenerationRequest) -> ClientResult<Job> {
        let url = self.config.endpoint("generate")?;
        debug!(source_url = %request.source_url, "Submitting generation request");

        let job: Job = self
            .send_json(self.request(Method::POST, url).json(request))
            .await?;

        info!(job_id = %job.job_id, status = %job.status, "Generation job accepted");
        Ok(job)
    }

    /// `GET /jobs/{job_id}`.
    pub async fn job_status(&self, job_id: &JobId) -> ClientResult<Job> {
        let path = format!("jobs/{}", urlencoding::encode(job_id.as_str()));
        let url = self.config.endpoint(&path)?;
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Stream a clip to `<dest_dir>/clip-<id>.mp4`, returning the written path.
    ///
    /// Download URLs are pre-signed, so no credential is attached. The file
    /// is written under a temporary name and renamed once complete.
    pub async fn download_clip(&self, clip: &Clip, dest_dir: &Path) -> ClientResult<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(clip.file_name());
        let partial = dest.with_extension("mp4.part");

        let response = self.http.get(&clip.download_url).send().await?;
        let response = check_status(response).await?;

        let written = match write_then_rename(response, &partial, &dest).await {
            Ok(written) => written,
            Err(e) => {
                tokio::fs::remove_file(&partial).await.ok();
                return Err(e);
            }
        };
        info!(clip_id = %clip.clip_id, bytes = written, path = %dest.display(), "Clip downloaded");
        Ok(dest)
    }

    fn request(&self, method: Method, url: url::Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credential {
            Some(credential) => builder.bearer_auth(credential.expose()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = check_status(builder.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "API request failed: {}", body);
    Err(ClientError::from_response(status.as_u16(), &body))
}

/// Stream the body into `partial`, then move it to `dest`. The caller removes
/// `partial` on any error.
async fn write_then_rename(response: Response, partial: &Path, dest: &Path) -> ClientResult<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(partial, dest).await?;
    Ok(written)
}

#[async_trait]
impl JobApi for ApiClient {
    async fn start_generation(&self, request: &GenerationRequest) -> ClientResult<Job> {
        ApiClient::start_generation(self, request).await
    }

    async fn job_status(&self, job_id: &JobId) -> ClientResult<Job> {
        ApiClient::job_status(self, job_id).await
    }
}
