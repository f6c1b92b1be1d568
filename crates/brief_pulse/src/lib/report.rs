//! # Report Renderer
//!
//! Emits the standalone HTML briefing: header, summary, key points with
//! timestamp deep links, and a transcript viewer listing every merged
//! segment with a seek link back into the source video.

use crate::{
    analyze::Analysis,
    subtitle::{display_time, Segment},
};

/// Render the full report document.
pub fn render_report(
    title: &str,
    source_url: &str,
    analysis: &Analysis,
    segments: &[Segment],
) -> String {
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let title = html_escape(title);
    let url = html_escape(source_url);

    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Video Briefing</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
        .header {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .summary {{ background: #e8f4fd; padding: 15px; border-radius: 8px; margin-bottom: 20px; }}
        .key-point {{ background: white; border: 1px solid #ddd; padding: 15px; margin-bottom: 15px; border-radius: 8px; }}
        .timestamp {{ background: #007bff; color: white; padding: 4px 8px; border-radius: 4px; text-decoration: none; }}
        .timestamp:hover {{ background: #0056b3; }}
        .quote {{ font-style: italic; color: #666; margin-top: 10px; }}
        .transcript {{ margin-top: 30px; }}
        .segment {{ display: flex; gap: 12px; padding: 6px 0; border-bottom: 1px solid #eee; }}
        .segment .seek {{ color: #007bff; text-decoration: none; white-space: nowrap; }}
        .segment .seek:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <p><strong>Source:</strong> <a href="{url}" target="_blank">{url}</a></p>
        <p><strong>Generated:</strong> {generated_at}</p>
    </div>

    <div class="summary">
        <h2>Summary</h2>
        <p>{summary}</p>
    </div>

    <div class="key-points">
        <h2>Key Points</h2>
"#,
        summary = html_escape(&analysis.summary),
    );

    for (i, point) in analysis.key_points.iter().enumerate() {
        html.push_str(&format!(
            r#"        <div class="key-point">
            <h3>{n}. {point}</h3>
            <p>{explanation}</p>
            <p><a href="{link}" target="_blank" class="timestamp">{time}</a></p>
"#,
            n = i + 1,
            point = html_escape(&point.point),
            explanation = html_escape(&point.explanation),
            link = seek_url(source_url, point.timestamp),
            time = display_time(point.timestamp),
        ));
        if let Some(quote) = &point.quote {
            html.push_str(&format!(
                "            <div class=\"quote\">\u{201c}{}\u{201d}</div>\n",
                html_escape(quote)
            ));
        }
        html.push_str("        </div>\n");
    }

    html.push_str(
        r#"    </div>

    <div class="transcript">
        <h2>Transcript</h2>
"#,
    );

    for seg in segments {
        html.push_str(&format!(
            r#"        <div class="segment" data-start="{start}">
            <a class="seek" href="{link}" target="_blank">{time}</a>
            <span>{text}</span>
        </div>
"#,
            start = seg.start,
            link = seek_url(source_url, seg.start),
            time = display_time(seg.start),
            text = html_escape(&seg.text),
        ));
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

/// Deep link to `seconds` into the source video.
fn seek_url(source_url: &str, seconds: f64) -> String {
    let secs = seconds.max(0.0) as u64;
    let separator = if source_url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}s", html_escape(source_url), separator, secs)
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
