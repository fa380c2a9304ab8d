use std::fmt::Write;

use crate::feedback::DashboardSummary;

pub const SCRIPT_PATH: &str = "/static/js/script.js";
pub const SCRIPT: &str = include_str!("../static/js/script.js");

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

pub fn index() -> String {
    let body = format!(
        r#"<h1>Share your feedback</h1>
<form action="/submit-feedback" method="post" onsubmit="return validateForm()">
  <label>Name <input type="text" name="name" maxlength="120" required></label>
  <label>Email <input type="email" name="email" maxlength="120" required></label>
  <label>Rating
    <select name="rating" required>
      <option value="">--</option>
      <option value="5">5 - Excellent</option>
      <option value="4">4 - Good</option>
      <option value="3">3 - Average</option>
      <option value="2">2 - Poor</option>
      <option value="1">1 - Terrible</option>
    </select>
  </label>
  <label>Comments <textarea name="comments"></textarea></label>
  <button type="submit">Submit</button>
</form>
<script src="{}"></script>"#,
        SCRIPT_PATH
    );
    page("Feedback", &body)
}

pub fn dashboard(summary: &DashboardSummary) -> String {
    let mut body = String::new();

    body.push_str("<h1>Admin dashboard</h1>\n");
    let _ = writeln!(body, "<p>Total feedback: <strong>{}</strong></p>", summary.total);
    let _ = writeln!(
        body,
        "<p>Average rating: <strong>{}</strong></p>",
        summary.average_rating
    );

    body.push_str("<h2>Ratings</h2>\n<ul>\n");
    for (rating, count) in summary.rating_histogram.iter().rev() {
        let _ = writeln!(body, "  <li>{} stars: {}</li>", rating, count);
    }
    body.push_str("</ul>\n");

    body.push_str(
        "<p><a href=\"/export-csv\">Download CSV</a> | <a href=\"/api/feedback\">JSON</a></p>\n",
    );

    body.push_str("<table>\n<tr><th>ID</th><th>Name</th><th>Email</th><th>Rating</th><th>Comments</th><th>Submitted</th></tr>\n");
    for f in &summary.records {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            f.id,
            escape(&f.name),
            escape(&f.email),
            f.rating,
            escape(f.comments.as_deref().unwrap_or_default()),
            f.date_submitted.format("%Y-%m-%d %H:%M")
        );
    }
    body.push_str("</table>");

    page("Admin dashboard", &body)
}
