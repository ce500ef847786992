//! Builds the pipeline from configuration and runs it: storage and queue
//! clients, one consumer task per stage, the log-expiry sweep, and the
//! webhook server, supervised until the first failure or Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use intake_core::{
    AiContext, BlobStore, CallbackJob, LogClock, MessageLog, Outbox, OutgoingMessage,
    ProcessingJob, QueueClient, SurveyLlm, TelegramApi, UploadJob,
};
use intake_handlers::{
    AiContextProcessor, AttachmentFetcher, CallbackProcessor, MessageRouter, MessageSender,
    PipelineQueues, WebhookValidator,
};
use intake_openai::OpenAiSurveyClient;
use intake_queue::{
    connect, consume, create_stage_consumer, jetstream, setup_pipeline_stream, subjects,
    NatsQueueClient,
};
use intake_storage::{FsBlobStore, SqliteMessageLog};
use intake_telegram::TelegramClient;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::{self, AppState};

/// How often expired log rows are swept out of the store.
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Queue names for one subject prefix.
fn queue_names(prefix: &str) -> PipelineQueues {
    PipelineQueues {
        upload: subjects::upload(prefix),
        processing: subjects::processing(prefix),
        ai: subjects::ai(prefix),
        callback: subjects::callback(prefix),
        outgoing: subjects::outgoing(prefix),
    }
}

/// Wires every stage and runs until a task fails or the process is signalled.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = SqliteMessageLog::new(&config.database_url)
        .await
        .context("failed to open the message log")?;
    let log: Arc<dyn MessageLog> = Arc::new(store.clone());
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.blob_root.clone()));

    let nats = connect(&config.nats_url).await?;
    let js = jetstream(&nats);
    setup_pipeline_stream(&js, &config.queue_prefix).await?;
    let queue: Arc<dyn QueueClient> = Arc::new(NatsQueueClient::new(js.clone()));

    let api: Arc<dyn TelegramApi> = Arc::new(TelegramClient::with_base_url(
        config.telegram_bot_token.clone(),
        config.telegram_api_url.clone(),
    ));
    let llm: Arc<dyn SurveyLlm> = Arc::new(OpenAiSurveyClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));

    let clock = Arc::new(LogClock::new());
    let queues = queue_names(&config.queue_prefix);
    let outbox = Arc::new(Outbox::new(
        Arc::clone(&log),
        Arc::clone(&queue),
        Arc::clone(&clock),
        queues.outgoing.clone(),
    ));

    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    let fetcher = Arc::new(AttachmentFetcher::new(
        Arc::clone(&api),
        blobs,
        Arc::clone(&queue),
        Arc::clone(&outbox),
        queues.processing.clone(),
        config.max_retry_attempts,
    ));
    let consumer =
        create_stage_consumer(&js, &config.queue_prefix, &queues.upload, "upload-worker").await?;
    tasks.spawn(async move {
        consume(consumer, "upload", move |job: UploadJob| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.handle(&job).await }
        })
        .await?;
        Ok(())
    });

    let router = Arc::new(MessageRouter::new(
        Arc::clone(&log),
        Arc::clone(&queue),
        Arc::clone(&outbox),
        config.survey(),
        queues.ai.clone(),
        queues.outgoing.clone(),
    ));
    let consumer = create_stage_consumer(
        &js,
        &config.queue_prefix,
        &queues.processing,
        "processing-worker",
    )
    .await?;
    tasks.spawn(async move {
        consume(consumer, "processing", move |job: ProcessingJob| {
            let router = Arc::clone(&router);
            async move { router.handle(&job).await }
        })
        .await?;
        Ok(())
    });

    let ai = Arc::new(AiContextProcessor::new(llm, Arc::clone(&queue)));
    let consumer =
        create_stage_consumer(&js, &config.queue_prefix, &queues.ai, "ai-worker").await?;
    tasks.spawn(async move {
        consume(consumer, "ai", move |context: AiContext| {
            let ai = Arc::clone(&ai);
            async move { ai.handle(&context).await }
        })
        .await?;
        Ok(())
    });

    let callbacks = Arc::new(CallbackProcessor::new(
        Arc::clone(&api),
        Arc::clone(&outbox),
    ));
    let consumer = create_stage_consumer(
        &js,
        &config.queue_prefix,
        &queues.callback,
        "callback-worker",
    )
    .await?;
    tasks.spawn(async move {
        consume(consumer, "callback", move |job: CallbackJob| {
            let callbacks = Arc::clone(&callbacks);
            async move { callbacks.handle(&job).await }
        })
        .await?;
        Ok(())
    });

    let sender = Arc::new(MessageSender::new(
        Arc::clone(&api),
        Arc::clone(&log),
        Arc::clone(&clock),
    ));
    let consumer = create_stage_consumer(
        &js,
        &config.queue_prefix,
        &queues.outgoing,
        "outgoing-worker",
    )
    .await?;
    tasks.spawn(async move {
        consume(consumer, "outgoing", move |outgoing: OutgoingMessage| {
            let sender = Arc::clone(&sender);
            async move { sender.handle(&outgoing).await }
        })
        .await?;
        Ok(())
    });

    let sweeper = store.clone();
    tasks.spawn(async move {
        let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.expire_rows().await {
                warn!(error = %e, "log expiry sweep failed");
            }
        }
    });

    let validator = Arc::new(WebhookValidator::new(log, queue, outbox, clock, queues));
    let bind_addr = config.bind_addr.clone();
    tasks.spawn(async move { server::serve(AppState { validator }, &bind_addr).await });

    info!(
        prefix = %config.queue_prefix,
        bind_addr = %config.bind_addr,
        "Pipeline running"
    );

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping pipeline");
            Ok(())
        }
        finished = tasks.join_next() => match finished {
            Some(Ok(Ok(()))) => Err(anyhow::anyhow!("pipeline task exited unexpectedly")),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(anyhow::anyhow!("pipeline task panicked: {e}")),
            None => Ok(()),
        },
    };
    tasks.abort_all();
    outcome
}
