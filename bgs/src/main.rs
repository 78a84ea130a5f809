//! Wallwars BGS engine.
//!
//! Reads JSON-lines requests from stdin, writes one JSON response per line
//! to stdout, and logs to stderr. Sessions run concurrently (up to 256);
//! requests within one session are serialized by its mutex.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use wallwars_mcts::{Evaluator, HeuristicEvaluator};

mod adapter;
mod protocol;
mod session;

use session::{BgsEngineConfig, SessionManager};

/// Queue depth of the batched inference layer.
#[cfg(feature = "onnx")]
const BATCH_QUEUE_SIZE: usize = 4096;

#[derive(Parser, Debug)]
#[command(
    name = "wallwars-bgs",
    about = "Wallwars BGS engine: reads JSON-lines requests on stdin, \
             answers on stdout"
)]
struct Args {
    /// Path to an ONNX model file, or 'simple' for the heuristic policy.
    #[arg(long, default_value = "simple")]
    model: String,

    /// MCTS samples per evaluate_position.
    #[arg(long, default_value_t = 1000)]
    samples: u32,

    /// Concurrent samples within one session's MCTS.
    #[arg(long, default_value_t = 4)]
    max_parallel_samples: usize,

    /// Base random seed; each session derives its own from this.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Evaluation cache capacity (model-backed evaluators only).
    #[arg(long, default_value_t = 100_000)]
    cache_size: usize,

    /// Model grid rows.
    #[arg(long, default_value_t = 8)]
    model_rows: i32,

    /// Model grid columns.
    #[arg(long, default_value_t = 8)]
    model_columns: i32,

    /// Inference batch size (model-backed evaluators only).
    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Heuristic policy: prior mass given to pawn moves.
    #[arg(long, default_value_t = 0.3)]
    move_prior: f32,

    /// Heuristic policy: bias for pawn steps toward the objective.
    #[arg(long, default_value_t = 1.5)]
    good_move: f32,

    /// Heuristic policy: bias for pawn steps away from the objective.
    #[arg(long, default_value_t = 0.75)]
    bad_move: f32,
}

fn build_evaluator(args: &Args) -> anyhow::Result<Arc<dyn Evaluator>> {
    if args.model == "simple" {
        info!(
            move_prior = args.move_prior,
            good_move = args.good_move,
            bad_move = args.bad_move,
            "using heuristic policy"
        );
        return Ok(Arc::new(HeuristicEvaluator::new(
            args.move_prior,
            args.good_move,
            args.bad_move,
        )));
    }

    #[cfg(feature = "onnx")]
    {
        use wallwars_mcts::{
            BatchedModel, BatchedModelEvaluator, CachedEvaluator, Model, OnnxModel,
        };

        info!(model = %args.model, "loading ONNX model");
        let model: Arc<dyn Model> = Arc::new(
            OnnxModel::load(
                &args.model,
                args.batch_size,
                args.model_rows,
                args.model_columns,
                8,
            )
            .with_context(|| format!("loading model '{}'", args.model))?,
        );

        let batched = BatchedModel::new(vec![model], BATCH_QUEUE_SIZE);
        let evaluator = CachedEvaluator::new(BatchedModelEvaluator::new(batched), args.cache_size);
        return Ok(Arc::new(evaluator));
    }

    #[cfg(not(feature = "onnx"))]
    {
        anyhow::bail!(
            "built without the 'onnx' feature; only --model simple is available (got '{}')",
            args.model
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("wallwars_bgs=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let evaluator = build_evaluator(&args)?;
    let config = BgsEngineConfig {
        samples_per_move: args.samples,
        max_parallel_samples: args.max_parallel_samples,
        base_seed: args.seed,
        model_rows: args.model_rows,
        model_columns: args.model_columns,
    };
    let manager = Arc::new(SessionManager::new(evaluator, config));

    info!(
        samples = args.samples,
        model_rows = args.model_rows,
        model_columns = args.model_columns,
        "wallwars BGS engine started"
    );

    // Responses are written whole-line under one lock; order across
    // concurrent requests is unspecified by the protocol.
    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        // A malformed line is logged and dropped; it must not take the
        // stream down with it.
        let request: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(parse_error) => {
                error!(%parse_error, "dropping malformed request line");
                continue;
            }
        };

        debug!(%request, "received request");

        let manager = Arc::clone(&manager);
        let stdout = Arc::clone(&stdout);
        tokio::spawn(async move {
            let response = session::handle_request(&manager, request).await;
            match serde_json::to_string(&response) {
                Ok(mut text) => {
                    text.push('\n');
                    let mut out = stdout.lock().await;
                    if let Err(write_error) = out.write_all(text.as_bytes()).await {
                        error!(%write_error, "failed to write response");
                        return;
                    }
                    let _ = out.flush().await;
                }
                Err(serialize_error) => {
                    error!(%serialize_error, "failed to serialize response");
                }
            }
        });
    }

    info!("stdin closed, shutting down");
    Ok(())
}
