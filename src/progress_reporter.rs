use std::sync::Arc;
use std::time::Duration;

use circular_buffer::CircularBuffer;

use indicatif::{MultiProgress, ProgressBar, ProgressState, ProgressStyle};

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::shared_types::ValueCount;

pub(crate) struct ProgressReporter {
    rx_progress: mpsc::Receiver<ValueCount>,
    span: u64,
    multi_progress: MultiProgress,
}

impl ProgressReporter {
    pub(crate) fn new(
        rx_progress: mpsc::Receiver<ValueCount>,
        span: u64,
        multi_progress: MultiProgress,
    ) -> Self {
        Self {
            rx_progress,
            span,
            multi_progress,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        spawn_progress_reporter(self.span, self.rx_progress, self.multi_progress)
    }
}

fn spawn_progress_reporter(
    span: u64,
    mut rx_progress: mpsc::Receiver<ValueCount>,
    multi: MultiProgress,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut progress: u64 = 0;
        type ProgressPoint = (ValueCount, Instant);
        let progress_q = Arc::new(RwLock::new(CircularBuffer::<50, ProgressPoint>::new()));
        let pb = multi.add(ProgressBar::new(span));
        pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {human_pos}/{human_len} ({eta}) ({msg})")
        .unwrap()
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.1}s", state.eta().as_secs_f64()).unwrap())
        .progress_chars("#>-"));

        // Spawn a task to update the scan rate every 500ms
        {
            let progress_q = progress_q.clone();
            let pb = pb.clone();
            const UPDATE_INTERVAL: Duration = Duration::from_millis(500);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(UPDATE_INTERVAL).await;
                    let q = progress_q.read().await;
                    let back = q.back();
                    let front = q.front();
                    if let (
                        Some((latest_count, latest_instant)),
                        Some((oldest_count, oldest_instant)),
                    ) = (back, front)
                    {
                        if latest_count == oldest_count {
                            continue;
                        }
                        let rate = (latest_count - oldest_count) as f64
                            / latest_instant.duration_since(*oldest_instant).as_secs_f64();
                        pb.set_message(format_rate(rate));
                    }
                }
            });
        }

        while let Some(batch) = rx_progress.recv().await {
            progress += batch;
            pb.set_position(progress);
            let mut q = progress_q.write().await;
            q.push_back((progress, Instant::now()));
        }
        let elapsed = pb.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            progress as f64 / elapsed
        } else {
            0.0
        };
        pb.finish_with_message(format_rate(rate));
    })
}

fn format_rate(per_sec: f64) -> String {
    if per_sec >= 1_000_000.0 {
        format!("{:.1} Mval/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1} kval/s", per_sec / 1_000.0)
    } else {
        format!("{per_sec:.0} val/s")
    }
}
