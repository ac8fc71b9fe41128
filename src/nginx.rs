use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::app::App;

/// Configuration for the host nginx site fronting the application.
///
/// # Example
///
/// ```
/// use horilla_installer::nginx::Nginx;
///
/// let site = Nginx::new("127.0.0.1:8000")
///     .static_root("/opt/horilla/staticfiles")
///     .gzip();
///
/// assert!(site.gzip);
/// assert_eq!(site.upstream, "127.0.0.1:8000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nginx {
    pub upstream: String,
    pub static_root: Option<String>,
    pub media_root: Option<String>,
    pub max_body_size: String,
    pub gzip: bool,
    pub security_headers: bool,
}

impl Nginx {
    #[must_use]
    pub fn new(upstream: &str) -> Self {
        Self {
            upstream: upstream.to_string(),
            static_root: None,
            media_root: None,
            max_body_size: "100M".to_string(),
            gzip: false,
            security_headers: false,
        }
    }

    /// Site for an installed app: static and media files served
    /// straight from the install directory.
    #[must_use]
    pub fn for_app(app: &App, install_dir: &Path) -> Self {
        let dir = install_dir.display();
        Self::new(&app.upstream())
            .static_root(&format!("{dir}/{}", app.static_dir))
            .media_root(&format!("{dir}/{}", app.media_dir))
            .gzip()
            .security_headers()
    }

    #[must_use]
    pub fn static_root(mut self, path: &str) -> Self {
        self.static_root = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn media_root(mut self, path: &str) -> Self {
        self.media_root = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: &str) -> Self {
        self.max_body_size = size.to_string();
        self
    }

    #[must_use]
    pub const fn gzip(mut self) -> Self {
        self.gzip = true;
        self
    }

    #[must_use]
    pub const fn security_headers(mut self) -> Self {
        self.security_headers = true;
        self
    }
}

/// Render a complete plain-HTTP server block. certbot rewrites it
/// in place to add TLS and the redirect.
#[must_use]
pub fn render(site: &Nginx, domain: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "server {{");
    let _ = writeln!(out, "    listen 80;");
    let _ = writeln!(out, "    listen [::]:80;");
    let _ = writeln!(out, "    server_name {domain};");
    out.push('\n');
    let _ = writeln!(out, "    client_max_body_size {};", site.max_body_size);

    if site.gzip {
        out.push('\n');
        let _ = writeln!(out, "    gzip on;");
        let _ = writeln!(
            out,
            "    gzip_types text/plain text/css application/json application/javascript text/xml application/xml image/svg+xml;"
        );
    }

    if site.security_headers {
        out.push('\n');
        let _ = writeln!(out, "    add_header X-Frame-Options \"SAMEORIGIN\" always;");
        let _ = writeln!(out, "    add_header X-Content-Type-Options \"nosniff\" always;");
        let _ = writeln!(out, "    add_header Referrer-Policy \"strict-origin-when-cross-origin\" always;");
    }

    out.push('\n');
    let _ = writeln!(out, "    location /.well-known/acme-challenge/ {{");
    let _ = writeln!(out, "        root /var/www/html;");
    let _ = writeln!(out, "    }}");

    for (prefix, root) in [("static", &site.static_root), ("media", &site.media_root)] {
        if let Some(root) = root {
            out.push('\n');
            let _ = writeln!(out, "    location /{prefix}/ {{");
            let _ = writeln!(out, "        alias {}/;", root.trim_end_matches('/'));
            let _ = writeln!(out, "    }}");
        }
    }

    out.push('\n');
    let _ = writeln!(out, "    location / {{");
    let _ = writeln!(out, "        proxy_pass http://{};", site.upstream);
    let _ = writeln!(out, "        proxy_set_header Host $host;");
    let _ = writeln!(out, "        proxy_set_header X-Real-IP $remote_addr;");
    let _ = writeln!(out, "        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;");
    let _ = writeln!(out, "        proxy_set_header X-Forwarded-Proto $scheme;");
    let _ = writeln!(out, "        proxy_read_timeout 300;");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    out
}

/// `sites-available` file and its `sites-enabled` symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub available: PathBuf,
    pub enabled: PathBuf,
}

impl SitePaths {
    #[must_use]
    pub fn new(available_dir: &Path, enabled_dir: &Path, name: &str) -> Self {
        Self {
            available: available_dir.join(name),
            enabled: enabled_dir.join(name),
        }
    }
}
