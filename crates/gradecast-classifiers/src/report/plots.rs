use plotly::layout::{Axis, Layout};
use plotly::{Histogram, Plot};

/// Plot a histogram of pass probabilities, split by the true class.
pub fn plot_probability_histogram(
    probabilities: &[f64],
    labels: &[u8],
    title: &str,
) -> Result<Plot, String> {
    if probabilities.len() != labels.len() {
        return Err(format!(
            "Probabilities and labels must have the same length ({} vs {})",
            probabilities.len(),
            labels.len()
        ));
    }

    let mut pass_probs = Vec::new();
    let mut fail_probs = Vec::new();

    for (p, label) in probabilities.iter().zip(labels.iter()) {
        if *label == 1 {
            pass_probs.push(*p);
        } else {
            fail_probs.push(*p);
        }
    }

    let trace_pass = Histogram::new(pass_probs).name("True pass");

    let trace_fail = Histogram::new(fail_probs).name("True fail");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("P(pass)"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(trace_pass);
    plot.add_trace(trace_fail);
    plot.set_layout(layout);

    Ok(plot)
}
