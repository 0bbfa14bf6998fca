use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar for the detail fetch phase, drawn on stderr
///
/// Returns a hidden bar when `visible` is false so callers never branch.
pub fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
    pb.set_message("Traversing each earthquake activity");
    pb
}
