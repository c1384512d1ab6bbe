mod pipeline;

use anyhow::Result;
use coach_analysis::{AnalysisEvent, AnalyzerConfig};
use coach_config::AppConfig;
use coach_feedback::{
    ConsoleFeedback, FeedbackDispatcher, LogPulseSink, PatternScheduler, PulsePattern,
};
use coach_imu::ImuClient;
use coach_session::{ProfileStore, SessionRecord};
use pipeline::CoachPipeline;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Status heartbeat interval, in ticks.
const HEARTBEAT_TICKS: u64 = 300;

fn analyzer_config(config: &AppConfig) -> AnalyzerConfig {
    AnalyzerConfig {
        enter_threshold: config.analysis.enter_threshold_deg,
        bottom_threshold: config.analysis.bottom_threshold_deg,
        standing_threshold: config.analysis.standing_threshold_deg,
        min_descent_time: Duration::from_secs_f32(config.analysis.min_descent_secs),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportcoach=info,coach_imu=info,coach_analysis=info".into()),
        )
        .init();

    info!("SportCoach rep counter starting");

    // Load config.
    let config = coach_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Connect to the phone stream (fall back to the simulator).
    let mut imu_client = match &config.imu.address {
        Some(addr) => {
            match ImuClient::connect(
                addr,
                config.imu.fusion_beta,
                config.imu.bias_samples,
                config.imu.sample_rate_hz,
            )
            .await
            {
                Ok(client) => {
                    info!("Phone IMU connected");
                    client
                }
                Err(e) => {
                    warn!(?e, "Phone not available, using simulated motion");
                    ImuClient::simulated(config.imu.sample_rate_hz)
                }
            }
        }
        None => {
            info!("No IMU address configured, using simulated motion");
            ImuClient::simulated(config.imu.sample_rate_hz)
        }
    };

    // Build the pipeline and feedback chain with explicit ownership.
    let mut pipeline =
        CoachPipeline::new(analyzer_config(&config), config.smoothing.responsiveness);
    let mut dispatcher = FeedbackDispatcher::new();
    dispatcher.register(Box::new(ConsoleFeedback));
    let mut scheduler = PatternScheduler::new();
    let mut pulse_sink = LogPulseSink;

    // Session bookkeeping.
    let store = ProfileStore::for_profile(&config.feedback.profile_name)?;
    let mut profile = store.load_or_create(&config.feedback.profile_name)?;
    let mut session = SessionRecord::started_now("squat");
    let session_start = Instant::now();

    info!(
        profile = %profile.name,
        level = profile.level,
        "Session started — [c]alibrate, [r]ecalibrate gyro bias, [s]tatus, [q]uit"
    );

    let mut interval =
        tokio::time::interval(Duration::from_secs_f32(1.0 / config.tick_rate_hz.max(1.0)));
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut tick_count: u64 = 0;
    let mut last_milestone = 0_u32;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = session_start.elapsed();

                // One pipeline pass per tick, only when a fresh sample
                // arrived; a silent source freezes the state machine.
                if let Some(sample) = imu_client.try_latest() {
                    let events = pipeline.tick(&sample, now);

                    for event in events {
                        match &event {
                            AnalysisEvent::Rep(rep) => {
                                session.reps = rep.count;
                                if config.feedback.haptics {
                                    scheduler.play(PulsePattern::rep_complete(), now);
                                    // Every tenth rep gets the milestone pattern.
                                    if rep.count / 10 > last_milestone / 10 {
                                        scheduler.play(PulsePattern::achievement(), now);
                                    }
                                    last_milestone = rep.count;
                                }
                            }
                            AnalysisEvent::BadForm(_) => {
                                session.warnings += 1;
                                if config.feedback.haptics {
                                    scheduler.play(PulsePattern::bad_form(), now);
                                }
                            }
                        }
                        dispatcher.push(event);
                    }
                    dispatcher.drain();
                }

                scheduler.tick(now, &mut pulse_sink);

                tick_count += 1;
                if tick_count % HEARTBEAT_TICKS == 0 {
                    tracing::debug!(
                        state = %pipeline.state(),
                        angle = pipeline.current_angle(),
                        reps = pipeline.rep_count(),
                        "Tick heartbeat"
                    );
                }
            }

            line = stdin.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim() {
                    "c" => {
                        // Capture the zero pose from the latest raw sample.
                        let sample = imu_client.latest();
                        pipeline.calibrate(&sample);
                    }
                    "r" => {
                        imu_client.recalibrate_bias(config.imu.bias_samples);
                    }
                    "s" => {
                        info!(
                            state = %pipeline.state(),
                            angle = format!("{:.1}", pipeline.current_angle()),
                            reps = pipeline.rep_count(),
                            message = pipeline.last_message().unwrap_or(""),
                            "Status"
                        );
                    }
                    "q" => break,
                    "" => {}
                    other => warn!(%other, "Unknown command"),
                }
            }
        }
    }

    // Persist the session and config on the way out.
    session.duration_secs = session_start.elapsed().as_secs_f32();
    session.reps = pipeline.rep_count();
    profile.record_session(session);
    store.save(&profile)?;
    coach_config::save_config(&config)?;

    info!(
        reps = pipeline.rep_count(),
        level = profile.level,
        "Session finished"
    );
    Ok(())
}
