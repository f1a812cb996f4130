//! Text and HTML renderings of the result grid

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::processing::ResizedImage;

/// One line per result: `<index>. <name> (<w>x<h>)`, 1-based
pub fn render_listing(results: &[ResizedImage]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(index, image)| match image.dimensions {
            Some((width, height)) => format!("{}. {} ({}x{})", index + 1, image.name, width, height),
            None => format!("{}. {}", index + 1, image.name),
        })
        .collect()
}

const GALLERY_CSS: &str = "\
.grid { display: flex; flex-wrap: wrap; }
.cell { width: 33.33%; margin-bottom: 20px; display: flex; align-items: center; }
.index { font-weight: bold; padding-right: 10px; }
.name { padding-left: 10px; }
";

/// Standalone HTML page showing index, preview and name of each result
pub fn render_gallery(results: &[ResizedImage]) -> String {
    gallery_page(results).into_string()
}

fn gallery_page(results: &[ResizedImage]) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "Resized images" }
                style { (PreEscaped(GALLERY_CSS)) }
            }
            body {
                h3 { "Resized images (total: " (results.len()) ")" }
                div.grid {
                    @for (index, image) in results.iter().enumerate() {
                        div.cell {
                            span.index { (index + 1) "." }
                            img src=(image.data_uri) alt={ "resized-" (index) };
                            span.name { (image.name) }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, dimensions: Option<(u32, u32)>) -> ResizedImage {
        ResizedImage {
            name: name.to_string(),
            data_uri: "data:image/png;base64,iVBORw==".to_string(),
            bytes: Vec::new(),
            dimensions,
        }
    }

    #[test]
    fn test_listing() {
        let lines = render_listing(&[image("a.png", Some((35, 28))), image("b.jpg", None)]);
        assert_eq!(lines, ["1. a.png (35x28)", "2. b.jpg"]);
    }

    #[test]
    fn test_gallery_escapes_names() {
        let html = render_gallery(&[image("<script>.png", None)]);
        assert!(html.contains("total: 1"));
        assert!(html.contains("&lt;script&gt;.png"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("src=\"data:image/png;base64,iVBORw==\""));
    }

    #[test]
    fn test_gallery_keeps_selection_order() {
        let html = render_gallery(&[image("b.png", None), image("a.png", None)]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("alt=\"resized-1\""));
        let first = html.find("b.png").unwrap();
        let second = html.find("a.png").unwrap();
        assert!(first < second);
    }
}
