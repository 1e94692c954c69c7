use std::path::Path;

use chrono::Utc;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
header { border-bottom: 2px solid #ddd; margin-bottom: 1.5rem; }
.subtitle { color: #666; }
section { margin-bottom: 2rem; }
table { border-collapse: collapse; margin: 0.5rem 0; }
th, td { border: 1px solid #ddd; padding: 0.3rem 0.8rem; text-align: right; }
th:first-child, td:first-child { text-align: left; }
pre { background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; }
";

enum Block {
    Html(Markup),
    Plot(Plot),
}

/// A titled group of HTML blocks and plots.
pub struct ReportSection {
    title: String,
    blocks: Vec<Block>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(Block::Html(content));
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(Block::Plot(plot));
    }
}

/// Self-contained HTML report. Plots are rendered inline and pull plotly.js
/// from its CDN.
pub struct Report {
    name: String,
    version: String,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(name: &str, version: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let mut plot_id = 0usize;
        let generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p class="subtitle" {
                            (self.name) " v" (self.version) " · generated " (generated)
                        }
                    }
                    @for section in &self.sections {
                        section {
                            h2 { (section.title) }
                            @for block in &section.blocks {
                                @match block {
                                    Block::Html(content) => { (content) }
                                    Block::Plot(plot) => {
                                        ({
                                            plot_id += 1;
                                            PreEscaped(plot.to_inline_html(Some(&format!("plot-{}", plot_id))))
                                        })
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };
        markup.into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}
