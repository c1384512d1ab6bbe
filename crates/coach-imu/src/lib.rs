pub mod calibration;
pub mod fusion;
pub mod protocol;
pub mod simulate;
pub mod smoothing;
pub mod types;

pub use calibration::CalibrationFilter;
pub use smoothing::MotionSmoother;
pub use types::{OrientationSample, RawImuSample};

use anyhow::Result;
use fusion::SensorFusion;
use protocol::{FrameParser, StreamFrame};
use simulate::SimulatedMotion;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

/// Commands sent to the IMU processing task.
enum ImuCommand {
    RecalibrateBias(u32),
}

/// Client for a phone streaming IMU data over TCP.
///
/// Connects to the companion app on the phone, parses the binary sensor
/// stream, runs Madgwick fusion when the phone sends raw frames, and
/// publishes the latest orientation sample. The host drains at most one
/// sample per tick; if the source goes quiet the tick is a no-op and the
/// downstream state machine freezes in place.
pub struct ImuClient {
    sample_rx: watch::Receiver<OrientationSample>,
    command_tx: mpsc::UnboundedSender<ImuCommand>,
    _task: tokio::task::JoinHandle<()>,
}

impl ImuClient {
    /// Connect to the phone's sensor stream and start processing.
    pub async fn connect(
        addr: &str,
        fusion_beta: f32,
        bias_samples: u32,
        sample_rate_hz: f32,
    ) -> Result<Self> {
        tracing::info!(%addr, "Connecting to phone IMU stream");
        let stream = TcpStream::connect(addr).await?;
        tracing::info!("Connected to phone IMU stream");

        let (sample_tx, sample_rx) = watch::channel(OrientationSample::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(imu_read_loop(
            stream,
            sample_tx,
            command_rx,
            fusion_beta,
            bias_samples,
            sample_rate_hz,
        ));

        Ok(Self {
            sample_rx,
            command_tx,
            _task: task,
        })
    }

    /// Run against the scripted motion generator instead of a phone.
    pub fn simulated(sample_rate_hz: f32) -> Self {
        let (sample_tx, sample_rx) = watch::channel(OrientationSample::default());
        let (command_tx, _) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let period = Duration::from_secs_f32(1.0 / sample_rate_hz.max(1.0));
            let mut interval = tokio::time::interval(period);
            let mut sim = SimulatedMotion::new();
            let start = Instant::now();
            let mut seq = 0_u64;

            loop {
                interval.tick().await;
                let (attitude, accel) = sim.step(period);
                seq += 1;
                let sample = OrientationSample {
                    attitude,
                    accel,
                    seq,
                    elapsed: start.elapsed(),
                };
                if sample_tx.send(sample).is_err() {
                    break;
                }
            }
        });

        Self {
            sample_rx,
            command_tx,
            _task: task,
        }
    }

    /// Latest published sample (non-blocking), whether or not it is new.
    pub fn latest(&self) -> OrientationSample {
        *self.sample_rx.borrow()
    }

    /// The newest sample if one arrived since the last call, else `None`.
    pub fn try_latest(&mut self) -> Option<OrientationSample> {
        match self.sample_rx.has_changed() {
            Ok(true) => Some(*self.sample_rx.borrow_and_update()),
            Ok(false) => None,
            // Sender dropped: the source is gone, freeze downstream.
            Err(_) => None,
        }
    }

    /// Restart gyro bias calibration (raw-frame streams only).
    pub fn recalibrate_bias(&self, samples: u32) {
        let _ = self.command_tx.send(ImuCommand::RecalibrateBias(samples));
    }
}

/// Background task: read TCP bytes, parse frames, fuse if needed, publish.
async fn imu_read_loop(
    mut stream: TcpStream,
    sample_tx: watch::Sender<OrientationSample>,
    mut command_rx: mpsc::UnboundedReceiver<ImuCommand>,
    fusion_beta: f32,
    bias_samples: u32,
    sample_rate_hz: f32,
) {
    let mut parser = FrameParser::new();
    let mut fusion = SensorFusion::new(fusion_beta, bias_samples, sample_rate_hz);
    let mut buf = [0u8; 4096];
    let start = Instant::now();
    let mut seq = 0_u64;

    loop {
        tokio::select! {
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        tracing::warn!("IMU TCP connection closed");
                        break;
                    }
                    Ok(n) => {
                        parser.push_data(&buf[..n]);

                        // Drain all frames available so far.
                        while let Some(frame) = parser.next_frame() {
                            let attitude_accel = match frame {
                                Ok(StreamFrame::Attitude { attitude, accel }) => {
                                    Some((attitude, accel))
                                }
                                Ok(StreamFrame::Raw(raw)) => {
                                    fusion.update(&raw).map(|attitude| (attitude, raw.accel))
                                }
                                Err(e) => {
                                    tracing::debug!(?e, "Skipping malformed frame");
                                    None
                                }
                            };

                            let Some((attitude, accel)) = attitude_accel else {
                                continue;
                            };
                            if !attitude.is_finite() || !accel.is_finite() {
                                tracing::trace!("Dropping non-finite sample");
                                continue;
                            }

                            seq += 1;
                            let sample = OrientationSample {
                                attitude: attitude.normalize(),
                                accel,
                                seq,
                                elapsed: start.elapsed(),
                            };
                            let _ = sample_tx.send(sample);

                            if seq % 1000 == 0 {
                                tracing::debug!(seq, "IMU samples processed");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "IMU TCP read error");
                        break;
                    }
                }
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    ImuCommand::RecalibrateBias(n) => fusion.restart_bias_calibration(n),
                }
            }
        }
    }
}
