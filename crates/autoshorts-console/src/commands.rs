//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use autoshorts_client::{
    ApiClient, AuthGate, ClientConfig, Credential, CredentialStore, FileCredentialStore, GenerationController,
    GenerationPhase, GenerationState, JobApi, JobPoller, PollConfig, PollControl, PollEvent,
    Session, INVALID_KEY_MESSAGE, SUBMIT_FAILED_MESSAGE,
};
use autoshorts_models::{Clip, JobId, JobStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::{Cli, Command, DownloadArgs, GenerateArgs, LoginArgs, SchemaArgs, SchemaKind, StatusArgs};
use crate::render;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    let store = match &cli.credential_file {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::from_env()?,
    };
    let mut gate = AuthGate::new(ApiClient::new(config, None)?, store);

    match cli.command {
        Command::Login(args) => login(&mut gate, args).await,
        Command::Logout => {
            gate.logout()?;
            println!("Logged out");
            Ok(())
        }
        Command::Schema(args) => schema(args),
        Command::Whoami => {
            let session = require_session(&mut gate).await?;
            println!("{}", render::profile(&session.user, session.client().credential()));
            Ok(())
        }
        Command::Generate(args) => {
            let session = require_session(&mut gate).await?;
            generate(&session, &args, PollConfig::from_env()).await
        }
        Command::Status(args) => {
            let session = require_session(&mut gate).await?;
            status(&session, args, PollConfig::from_env()).await
        }
        Command::Download(args) => {
            let session = require_session(&mut gate).await?;
            download(&session, args).await
        }
    }
}

/// Restore the stored session or fail with a hint to log in.
pub async fn require_session<S: CredentialStore>(gate: &mut AuthGate<S>) -> anyhow::Result<Session> {
    if !gate.restore().await? {
        bail!("Not logged in. Run `autoshorts login` first");
    }
    gate.session()
        .cloned()
        .context("session missing after restore")
}

pub async fn login<S: CredentialStore>(gate: &mut AuthGate<S>, args: LoginArgs) -> anyhow::Result<()> {
    let key = match args.key {
        Some(key) => key,
        None => {
            eprint!("API key: ");
            let mut line = String::new();
            BufReader::new(tokio::io::stdin())
                .read_line(&mut line)
                .await
                .context("failed to read API key")?;
            line
        }
    };

    let session = gate
        .login(&key)
        .await
        .map_err(|e| anyhow!(e.user_message(INVALID_KEY_MESSAGE)))?;
    println!(
        "Logged in as {} ({}) with key {}",
        session.user.email_label(),
        session.user.tier_label(),
        session.client().credential().map(Credential::masked).unwrap_or_default()
    );
    Ok(())
}

pub async fn generate(
    session: &Session,
    args: &GenerateArgs,
    poll: PollConfig,
) -> anyhow::Result<()> {
    let form = args.to_form(&session.user)?;
    let api = Arc::new(session.client().clone());
    let mut controller = GenerationController::new(Arc::clone(&api), poll);

    let job_id = controller
        .generate(&form)
        .await
        .map_err(|e| anyhow!(e.user_message(SUBMIT_FAILED_MESSAGE)))?;

    if args.no_wait {
        controller.cancel();
        println!("{}", job_id);
        return Ok(());
    }

    eprintln!("Submitted job {}", job_id);
    let state = follow(&mut controller).await?;
    print!("{}", render::outcome(&state));

    if state.phase != GenerationPhase::Completed {
        bail!("Job {} did not complete", job_id);
    }
    if let (Some(dir), Some(job)) = (&args.download, &state.job) {
        download_clips(&api, job.clips(), dir).await?;
    }
    Ok(())
}

/// Print progress until the generation settles. Ctrl-C stops following.
async fn follow<A: JobApi + ?Sized + 'static>(
    controller: &mut GenerationController<A>,
) -> anyhow::Result<GenerationState> {
    let mut rx = controller.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_key = None;

    loop {
        let state = rx.borrow_and_update().clone();
        let key = render::progress_key(&state);
        if last_key.as_ref() != Some(&key) {
            eprintln!("{}", render::progress_line(&state));
            last_key = Some(key);
        }
        if !state.is_generating {
            return Ok(state);
        }

        tokio::select! {
            changed = rx.changed() => changed?,
            _ = &mut ctrl_c => {
                controller.cancel();
                bail!("Stopped following; the job keeps running on the server");
            }
        }
    }
}

pub async fn status(session: &Session, args: StatusArgs, poll: PollConfig) -> anyhow::Result<()> {
    let client = session.client();
    let job_id = JobId::from_string(args.job_id);

    if !args.watch {
        let job = client.job_status(&job_id).await?;
        print!("{}", render::job(&job));
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut poller = JobPoller::new(Arc::new(client.clone()), poll);
    poller.start(job_id.clone(), move |event| {
        if tx.send(event).is_err() {
            PollControl::Stop
        } else {
            PollControl::Continue
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = &mut ctrl_c => {
                poller.cancel();
                return Ok(());
            }
        };

        match event {
            Some(PollEvent::Update(job)) if job.is_terminal() => {
                print!("{}", render::job(&job));
                return Ok(());
            }
            Some(PollEvent::Update(job)) => {
                eprintln!(
                    "[{}] {}{}",
                    job.job_id,
                    job.status,
                    job.message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default()
                );
            }
            Some(PollEvent::RetryScheduled { attempt, error }) => {
                eprintln!("Status check {} failed, retrying: {}", attempt, error);
            }
            Some(PollEvent::GaveUp { attempts, error }) => {
                bail!("Gave up on job {} after {} failed status checks: {}", job_id, attempts, error);
            }
            None => bail!("Polling of job {} stopped", job_id),
        }
    }
}

pub async fn download(session: &Session, args: DownloadArgs) -> anyhow::Result<()> {
    let client = session.client();
    let job = client.job_status(&JobId::from_string(args.job_id)).await?;
    if job.status != JobStatus::Completed {
        bail!(
            "Job {} is {}; clips are available once it completes",
            job.job_id,
            job.status
        );
    }

    let clips: Vec<Clip> = match &args.clip {
        Some(clip_id) => {
            let clip = job
                .clips()
                .iter()
                .find(|c| &c.clip_id == clip_id)
                .with_context(|| format!("Job {} has no clip {}", job.job_id, clip_id))?;
            vec![clip.clone()]
        }
        None => job.clips().to_vec(),
    };

    download_clips(client, &clips, &args.dir).await
}

async fn download_clips(client: &ApiClient, clips: &[Clip], dir: &Path) -> anyhow::Result<()> {
    if clips.is_empty() {
        bail!("No clips to download");
    }
    for clip in clips {
        let path = client
            .download_clip(clip, dir)
            .await
            .with_context(|| format!("failed to download clip {}", clip.clip_id))?;
        println!("{}", path.display());
    }
    info!(count = clips.len(), dir = %dir.display(), "Downloaded clips");
    Ok(())
}

pub fn schema(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.kind {
        SchemaKind::Request => autoshorts_models::generation_request_schema(),
        SchemaKind::Job => autoshorts_models::job_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshorts_client::{Credential, MemoryCredentialStore};
    use clap::Parser;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "dev@example.com",
                "tier": "Pro",
                "credits": 300
            })))
            .mount(server)
            .await;
    }

    async fn session_for(server: &MockServer) -> Session {
        let config = ClientConfig::new(&format!("{}/v1", server.uri())).unwrap();
        let store = MemoryCredentialStore::with_credential(Credential::new("key").unwrap());
        let mut gate = AuthGate::new(ApiClient::new(config, None).unwrap(), store);
        require_session(&mut gate).await.unwrap()
    }

    fn fast_polling() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(20),
            retry_delay: Duration::from_millis(10),
            max_consecutive_failures: Some(5),
        }
    }

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["autoshorts", "generate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Generate(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_follows_job_and_downloads_clips() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .and(body_partial_json(json!({"source_url": "https://youtu.be/abc"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-1", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job_id": "job-1",
                "status": "completed",
                "elapsed": 61.2,
                "result": {"clips": [{
                    "clip_id": "a",
                    "download_url": format!("{}/files/a.mp4", server.uri()),
                    "duration": 30.0
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/a.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session = session_for(&server).await;
        let dest = dir.path().to_string_lossy().to_string();
        let args = generate_args(&["https://youtu.be/abc", "--download", &dest]);

        generate(&session, &args, fast_polling()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("clip-a.mp4")).unwrap(), b"mp4");
    }

    #[tokio::test]
    async fn test_generate_reports_failed_job() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-2", "status": "queued"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs/job-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job_id": "job-2",
                "status": "failed",
                "message": "decode error"
            })))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let args = generate_args(&["https://youtu.be/abc"]);

        let err = generate(&session, &args, fast_polling()).await.unwrap_err();
        assert_eq!(err.to_string(), "Job job-2 did not complete");
    }

    #[tokio::test]
    async fn test_generate_surfaces_submission_detail() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(json!({"detail": "Insufficient credits"})),
            )
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let args = generate_args(&["https://youtu.be/abc"]);

        let err = generate(&session, &args, fast_polling()).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient credits");
    }

    #[tokio::test]
    async fn test_download_rejects_unfinished_job() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs/job-3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-3", "status": "processing"})),
            )
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let args = DownloadArgs {
            job_id: "job-3".to_string(),
            clip: None,
            dir: ".".into(),
        };

        let err = download(&session, args).await.unwrap_err();
        assert!(err.to_string().contains("is processing"));
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let server = MockServer::start().await;
        let config = ClientConfig::new(&server.uri()).unwrap();
        let mut gate = AuthGate::new(ApiClient::new(config, None).unwrap(), MemoryCredentialStore::new());

        let err = require_session(&mut gate).await.unwrap_err();
        assert!(err.to_string().starts_with("Not logged in"));
    }

    #[test]
    fn test_schema_prints() {
        tokio_test::assert_ok!(schema(SchemaArgs {
            kind: SchemaKind::Job
        }));
    }
}
