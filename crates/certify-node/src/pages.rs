//! Server-rendered HTML pages.
//!
//! Every user-supplied value goes through [`escape_html`] before it is
//! interpolated.

use certify_core::Certificate;

/// Stylesheet served at `/styles.css`.
pub const STYLESHEET: &str = r#"body {
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  background: #f4f6f8;
  color: #1f2933;
  margin: 0;
}
.container {
  max-width: 720px;
  margin: 3rem auto;
  padding: 0 1rem;
}
.card {
  background: #fff;
  border-radius: 8px;
  box-shadow: 0 1px 3px rgba(0, 0, 0, 0.12);
  padding: 1.5rem;
  margin-bottom: 1rem;
}
label { display: block; margin-top: 0.75rem; font-weight: 600; }
input { width: 100%; padding: 0.5rem; margin-top: 0.25rem; box-sizing: border-box; }
button { margin-top: 1rem; padding: 0.5rem 1.25rem; cursor: pointer; }
.invalid { color: #b42318; }
.valid { color: #067647; }
.muted { color: #616e7c; font-size: 0.9rem; }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{title}</title>
    <link rel="stylesheet" href="/styles.css" />
  </head>
  <body>
    <div class="container">
{body}
    </div>
  </body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

pub fn home_page() -> String {
    layout(
        "Certify",
        r#"      <h1>Certify</h1>
      <div class="card">
        <p>Verify a certificate by its ID or by scanning its QR code.</p>
        <p><a href="/verify">Verify a certificate</a></p>
        <p class="muted"><a href="/login">Admin login</a></p>
      </div>"#,
    )
}

/// Landing page shown when `/verify` is opened without an id.
pub fn verify_landing_page() -> String {
    layout(
        "Verify a Certificate",
        r#"      <h1>Verify a Certificate</h1>
      <div class="card">
        <form method="get" action="/verify">
          <label for="id">Certificate ID</label>
          <input id="id" name="id" required placeholder="e.g. 3f2b8c1e-..." />
          <button type="submit">Verify</button>
        </form>
      </div>
      <p><a href="/">Back to Home</a></p>"#,
    )
}

pub fn verify_not_found_page(id: &str) -> String {
    layout(
        "Certificate Not Found",
        &format!(
            r#"      <h1 class="invalid">Certificate Not Found</h1>
      <div class="card">
        <p>No certificate exists with ID <code>{}</code>.</p>
        <p>Check the ID and try again.</p>
      </div>
      <p><a href="/verify">Verify another certificate</a></p>
      <p><a href="/">Back to Home</a></p>"#,
            escape_html(id)
        ),
    )
}

/// Page for a valid certificate. `share_url` is the canonical link.
pub fn verify_valid_page(cert: &Certificate, share_url: &str) -> String {
    layout(
        "Certificate Verification",
        &format!(
            r#"      <h1 class="valid">Certificate is Valid</h1>
      <div class="card">
        <p><strong>Certificate ID:</strong> {id}</p>
        <p><strong>Recipient:</strong> {recipient}</p>
        <p><strong>Course:</strong> {course}</p>
        <p><strong>Issued On:</strong> {date}</p>
        <img src="{artifact}" alt="QR Code" style="max-width: 200px;" />
        <p><a href="{share}">Share verification link</a></p>
      </div>
      <p><a href="/">Back to Home</a></p>"#,
            id = escape_html(cert.id.as_str()),
            recipient = escape_html(&cert.recipient_name),
            course = escape_html(&cert.course_name),
            date = cert.issue_date.format("%Y-%m-%d"),
            artifact = escape_html(&cert.verification_artifact),
            share = escape_html(share_url),
        ),
    )
}

pub fn error_page() -> String {
    layout(
        "Server Error",
        r#"      <h1 class="invalid">Server error</h1>
      <div class="card"><p>Something went wrong. Please try again later.</p></div>"#,
    )
}

pub fn login_page() -> String {
    layout(
        "Admin Login",
        r#"      <h1>Admin Login</h1>
      <div class="card">
        <form id="login-form">
          <label for="username">Username</label>
          <input id="username" name="username" autocomplete="username" required />
          <label for="password">Password</label>
          <input id="password" name="password" type="password" autocomplete="current-password" required />
          <button type="submit">Log in</button>
        </form>
        <p id="login-error" class="invalid"></p>
      </div>
      <script>
        document.getElementById('login-form').addEventListener('submit', async (e) => {
          e.preventDefault();
          const res = await fetch('/api/login', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({
              username: document.getElementById('username').value,
              password: document.getElementById('password').value
            })
          });
          if (res.ok) {
            window.location = '/admin/dashboard';
          } else {
            document.getElementById('login-error').textContent = 'Invalid credentials';
          }
        });
      </script>"#,
    )
}

pub fn dashboard_page(username: &str) -> String {
    layout(
        "Admin Dashboard",
        &format!(
            r##"      <h1>Issue a Certificate</h1>
      <p class="muted">Signed in as {user}. <a href="#" id="logout">Log out</a></p>
      <div class="card">
        <form id="issue-form">
          <label for="recipientName">Recipient name</label>
          <input id="recipientName" name="recipientName" required />
          <label for="courseName">Course name</label>
          <input id="courseName" name="courseName" required />
          <label for="issueDate">Issue date (optional)</label>
          <input id="issueDate" name="issueDate" type="date" />
          <button type="submit">Issue</button>
        </form>
      </div>
      <div class="card" id="result" hidden>
        <p><strong>Certificate ID:</strong> <span id="result-id"></span></p>
        <img id="result-qr" alt="QR Code" style="max-width: 200px;" />
        <p><a id="result-link" href="#">Open verification page</a></p>
      </div>
      <p id="issue-error" class="invalid"></p>
      <script>
        document.getElementById('issue-form').addEventListener('submit', async (e) => {{
          e.preventDefault();
          const body = {{
            recipientName: document.getElementById('recipientName').value,
            courseName: document.getElementById('courseName').value,
            issueDate: document.getElementById('issueDate').value
          }};
          const res = await fetch('/api/certificates', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify(body)
          }});
          const data = await res.json();
          if (!res.ok) {{
            document.getElementById('issue-error').textContent = data.error || 'Issuance failed';
            return;
          }}
          const cert = data.certificate;
          document.getElementById('issue-error').textContent = '';
          document.getElementById('result-id').textContent = cert.id;
          document.getElementById('result-qr').src = cert.verificationArtifact;
          document.getElementById('result-link').href = '/verify?id=' + encodeURIComponent(cert.id);
          document.getElementById('result').hidden = false;
        }});
        document.getElementById('logout').addEventListener('click', async (e) => {{
          e.preventDefault();
          await fetch('/api/logout', {{ method: 'POST' }});
          window.location = '/login';
        }});
      </script>"##,
            user = escape_html(username)
        ),
    )
}
