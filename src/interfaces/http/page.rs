use url::Url;

use crate::application::ForecastOutcome;

pub struct IndexView<'a> {
    pub flashes: &'a [String],
    pub outcome: Option<&'a ForecastOutcome>,
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `/chart/<filename>` with the filename percent-encoded as one segment.
pub fn image_url(route: &str, filename: &str) -> String {
    let fallback = || format!("/{}/{}", route, filename);
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return fallback();
    };
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.push(route).push(filename);
        }
        Err(()) => return fallback(),
    }
    url.path().to_string()
}

pub fn render_index(view: &IndexView<'_>) -> String {
    let county_value = view
        .outcome
        .map(|outcome| escape_html(&outcome.county))
        .unwrap_or_default();
    let superchargers_value = view
        .outcome
        .and_then(|outcome| outcome.result.map(|result| result.x))
        .map(|x| x.to_string())
        .unwrap_or_default();

    let flashes = if view.flashes.is_empty() {
        String::new()
    } else {
        let items = view
            .flashes
            .iter()
            .map(|message| format!("      <li>{}</li>\n", escape_html(message)))
            .collect::<String>();
        format!("    <ul class=\"flashes\">\n{}    </ul>\n", items)
    };

    let outcome = view.outcome.map(render_outcome).unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>County EV Forecast</title>
  </head>
  <body>
    <h1>County EV Forecast</h1>
{flashes}    <form method="post" action="/">
      <label for="county">County</label>
      <input id="county" name="county" type="text" value="{county_value}">
      <label for="superchargers">Superchargers</label>
      <input id="superchargers" name="superchargers" type="text" inputmode="decimal" value="{superchargers_value}">
      <button type="submit">Forecast</button>
    </form>
{outcome}  </body>
</html>
"#
    )
}

fn render_outcome(outcome: &ForecastOutcome) -> String {
    let mut html = format!(
        "    <section class=\"county\">\n      <h2>{}</h2>\n",
        escape_html(&outcome.county)
    );

    if let Some(count) = outcome.supercharger_count {
        html.push_str(&format!(
            "      <p class=\"supercharger-count\">Current superchargers: {}</p>\n",
            count
        ));
    }

    match outcome.result {
        Some(result) => {
            let ev = result.ev_y.map(|y| format!("{:.2}", y)).unwrap_or_default();
            let adopt = result
                .adopt_y
                .map(|y| format!("{:.4}", y))
                .unwrap_or_default();
            html.push_str(&format!(
                "      <dl class=\"result\">\n        <dt>Superchargers (x)</dt><dd>{}</dd>\n        <dt>Predicted EVs</dt><dd>{}</dd>\n        <dt>Predicted adoption</dt><dd>{}</dd>\n      </dl>\n",
                result.x, ev, adopt
            ));
        }
        None => html.push_str("      <p class=\"result\">No supercharger count given.</p>\n"),
    }

    if let Some(chart) = &outcome.chart_filename {
        html.push_str(&format!(
            "      <img class=\"chart\" src=\"{}\" alt=\"Chart for {}\">\n",
            escape_html(&image_url("chart", chart)),
            escape_html(&outcome.county)
        ));
    }
    if let Some(map) = &outcome.map_filename {
        html.push_str(&format!(
            "      <img class=\"map\" src=\"{}\" alt=\"Map for {}\">\n",
            escape_html(&image_url("map", map)),
            escape_html(&outcome.county)
        ));
    }

    html.push_str("    </section>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::county::EvaluationResult;

    fn outcome() -> ForecastOutcome {
        ForecastOutcome {
            county: "San <Diego>".to_string(),
            result: Some(EvaluationResult {
                x: 3.0,
                ev_y: Some(7.0),
                adopt_y: Some(0.5),
            }),
            supercharger_count: None,
            chart_filename: Some("san diego chart.png".to_string()),
            map_filename: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_image_url_encodes_segment() {
        assert_eq!(image_url("chart", "san diego.png"), "/chart/san%20diego.png");
        assert_eq!(image_url("map", "a/b.png"), "/map/a%2Fb.png");
    }

    #[test]
    fn test_render_index_with_outcome() {
        let outcome = outcome();
        let flashes = vec!["No map image found for county: San <Diego>".to_string()];
        let html = render_index(&IndexView {
            flashes: &flashes,
            outcome: Some(&outcome),
        });
        assert!(html.contains("<h2>San &lt;Diego&gt;</h2>"));
        assert!(html.contains("<dd>7.00</dd>"));
        assert!(html.contains("<dd>0.5000</dd>"));
        assert!(html.contains("src=\"/chart/san%20diego%20chart.png\""));
        assert!(!html.contains("class=\"map\""));
        assert!(html.contains("<li>No map image found for county: San &lt;Diego&gt;</li>"));
    }

    #[test]
    fn test_render_empty_form() {
        let html = render_index(&IndexView {
            flashes: &[],
            outcome: None,
        });
        assert!(html.contains("<form method=\"post\" action=\"/\">"));
        assert!(!html.contains("class=\"flashes\""));
        assert!(!html.contains("<section"));
    }
}
