// file: src/index/progress.rs
// description: progress reporting for chunk embedding during index construction
// reference: https://docs.rs/indicatif

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct IndexProgress {
    bar: ProgressBar,
    chunks_embedded: Arc<AtomicUsize>,
    batches_completed: Arc<AtomicUsize>,
}

impl IndexProgress {
    /// A visible bar joins `multi` when given so it shares the terminal with
    /// other bars (e.g. the startup spinner) instead of overwriting them.
    pub fn new(
        total_chunks: usize,
        visible: bool,
        colored: bool,
        multi: Option<&MultiProgress>,
    ) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(total_chunks as u64),
            ProgressDrawTarget::hidden(),
        );
        let bar = match (visible, multi) {
            (false, _) => bar,
            (true, Some(multi)) => multi.add(bar),
            (true, None) => {
                bar.set_draw_target(ProgressDrawTarget::stderr());
                bar
            }
        };
        if visible {
            bar.set_style(progress_style(colored));
        }

        Self {
            bar,
            chunks_embedded: Arc::new(AtomicUsize::new(0)),
            batches_completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inc_batch(&self, chunks: usize) {
        self.chunks_embedded.fetch_add(chunks, Ordering::SeqCst);
        let batches = self.batches_completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.inc(chunks as u64);
        self.bar.set_message(format!("batches: {}", batches));
    }

    pub fn chunks_embedded(&self) -> usize {
        self.chunks_embedded.load(Ordering::SeqCst)
    }

    pub fn batches_completed(&self) -> usize {
        self.batches_completed.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for IndexProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn progress_style(colored: bool) -> ProgressStyle {
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} chunks ({eta}) {msg}",
            "=>-",
        )
    };

    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}
