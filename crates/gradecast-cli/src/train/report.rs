use anyhow::Result;
use maud::{html, Markup};

use gradecast_classifiers::pipeline::Pipeline;
use gradecast_classifiers::report::plots::plot_probability_histogram;
use gradecast_classifiers::report::{Report, ReportSection};
use gradecast_classifiers::stats::{ClassMetrics, ClassificationReport, CLASS_NAMES};

fn metrics_row(m: &ClassMetrics) -> Markup {
    html! {
        tr {
            td { (m.label) }
            td { (format!("{:.3}", m.precision)) }
            td { (format!("{:.3}", m.recall)) }
            td { (format!("{:.3}", m.f1)) }
            td { (m.support) }
        }
    }
}

fn metrics_table(report: &ClassificationReport) -> Markup {
    html! {
        p { "Held-out accuracy: " strong { (format!("{:.4}", report.accuracy)) } }
        table {
            thead {
                tr { th { "" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } }
            }
            tbody {
                @for class in &report.classes { (metrics_row(class)) }
                (metrics_row(&report.macro_avg))
                (metrics_row(&report.weighted_avg))
            }
        }
    }
}

fn confusion_table(report: &ClassificationReport) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "true \\ predicted" }
                    @for name in CLASS_NAMES { th { (name) } }
                }
            }
            tbody {
                @for (t, row) in report.confusion.iter().enumerate() {
                    tr {
                        td { (CLASS_NAMES[t]) }
                        @for count in row { td { (count) } }
                    }
                }
            }
        }
    }
}

/// Render the HTML training report for a fitted pipeline.
pub fn build_training_report(
    pipeline: &Pipeline,
    report: &ClassificationReport,
    probabilities: &[f64],
    y_true: &[u8],
) -> Result<Report> {
    let mut html_report = Report::new(
        "gradecast",
        clap::crate_version!(),
        "Gradecast Training Report",
    );

    let mut overview = ReportSection::new("Model");
    overview.add_content(html! {
        table {
            tbody {
                tr { td { "classifier" } td { (pipeline.model_name()) } }
                tr { td { "features" } td { (pipeline.feature_names().join(", ")) } }
                tr { td { "pass threshold" } td { (pipeline.pass_threshold()) } }
                tr { td { "seed" } td { (pipeline.model_config().seed) } }
                tr { td { "trained at" } td { (pipeline.trained_at().to_rfc3339()) } }
            }
        }
        pre { (serde_json::to_string_pretty(pipeline.model_config()).unwrap_or_default()) }
    });
    html_report.add_section(overview);

    let mut metrics = ReportSection::new("Held-out evaluation");
    metrics.add_content(metrics_table(report));
    metrics.add_content(html! { h3 { "Confusion matrix" } });
    metrics.add_content(confusion_table(report));
    html_report.add_section(metrics);

    let plot = plot_probability_histogram(
        probabilities,
        y_true,
        "Held-out pass probability by true class",
    )
    .map_err(anyhow::Error::msg)?;
    let mut distribution = ReportSection::new("Probability distribution");
    distribution.add_plot(plot);
    html_report.add_section(distribution);

    Ok(html_report)
}

pub fn write_training_report(
    pipeline: &Pipeline,
    report: &ClassificationReport,
    probabilities: &[f64],
    y_true: &[u8],
    path: &str,
) -> Result<()> {
    let html_report = build_training_report(pipeline, report, probabilities, y_true)?;
    html_report.save_to_file(path)?;
    Ok(())
}
