//! Embedded HTML pages.
//!
//! Both pages are self-contained with inline CSS; nothing is loaded from
//! the network.

/// Landing page served at `/`.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tokentap</title>
<style>
html,body{height:100%;margin:0;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,Helvetica,Arial,sans-serif;background:#1a1a2e;color:#e4e4e4}
body{display:flex;align-items:center;justify-content:center}
.card{max-width:520px;padding:32px 40px;border-radius:12px;background:#16213e;border:1px solid #2a2a4a;text-align:center}
h1{font-size:22px;margin:0 0 12px}
p{line-height:1.6;color:#8a8a9a}
a.button{display:inline-block;margin-top:16px;padding:10px 24px;border-radius:8px;background:#e94560;color:#fff;text-decoration:none}
a.button:hover{background:#ff6b81}
</style>
</head>
<body>
<div class="card">
<h1>tokentap</h1>
<p>Start the authorization code flow against the configured identity provider.
The tokens are printed in the terminal once the provider redirects back here.</p>
<a class="button" href="/login">Log in</a>
</div>
</body>
</html>
"##;

/// Page served after a successful token exchange.
pub const SUCCESS_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tokentap: success</title>
<style>
html,body{height:100%;margin:0;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,Helvetica,Arial,sans-serif;background:#1a1a2e;color:#e4e4e4}
body{display:flex;align-items:center;justify-content:center}
.card{max-width:520px;padding:32px 40px;border-radius:12px;background:#16213e;border:1px solid #4ecca3;text-align:center}
h1{font-size:22px;margin:0 0 12px;color:#4ecca3}
p{line-height:1.6;color:#8a8a9a}
</style>
</head>
<body>
<div class="card">
<h1>Tokens received</h1>
<p>Return to the terminal to see them. You can close this window.</p>
</div>
</body>
</html>
"##;
