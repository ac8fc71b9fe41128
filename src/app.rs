/// Describes the application being installed: where its source
/// lives, how its container is laid out, and how to reach it.
///
/// # Example
///
/// ```
/// use horilla_installer::App;
///
/// let app = App::horilla()
///     .branch("1.0")
///     .port(8080);
///
/// assert_eq!(app.name, "horilla");
/// assert_eq!(app.upstream(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub name: String,
    pub repository: String,
    pub branch: String,
    pub port: u16,
    pub workdir: String,
    pub wsgi_module: String,
    pub static_dir: String,
    pub media_dir: String,
    pub db_image: String,
}

impl App {
    #[must_use]
    pub fn new(name: &str, repository: &str) -> Self {
        Self {
            name: name.to_string(),
            repository: repository.to_string(),
            branch: "master".to_string(),
            port: 8000,
            workdir: "/app".to_string(),
            wsgi_module: format!("{name}.wsgi:application"),
            static_dir: "staticfiles".to_string(),
            media_dir: "media".to_string(),
            db_image: "postgres:16-alpine".to_string(),
        }
    }

    /// The Horilla HRMS upstream repository.
    #[must_use]
    pub fn horilla() -> Self {
        Self::new(
            "horilla",
            "https://github.com/horilla-opensource/horilla.git",
        )
    }

    #[must_use]
    pub fn repository(mut self, url: &str) -> Self {
        self.repository = url.to_string();
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn db_image(mut self, image: &str) -> Self {
        self.db_image = image.to_string();
        self
    }

    /// Loopback address nginx proxies to.
    #[must_use]
    pub fn upstream(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Compose service name of the web container.
    #[must_use]
    pub fn web_service(&self) -> String {
        format!("{}-web", self.name)
    }

    /// Compose service name of the database container.
    #[must_use]
    pub fn db_service(&self) -> String {
        format!("{}-db", self.name)
    }

    /// Arguments for a `manage.py` invocation inside the web
    /// container, suitable for appending to a compose command.
    #[must_use]
    pub fn manage(&self, args: &[&str]) -> Vec<String> {
        let mut out = vec![
            "exec".to_string(),
            "-T".to_string(),
            self.web_service(),
            "python3".to_string(),
            "manage.py".to_string(),
        ];
        out.extend(args.iter().map(|a| (*a).to_string()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let app = App::horilla();

        assert_eq!(app.name, "horilla");
        assert_eq!(app.branch, "master");
        assert_eq!(app.port, 8000);
        assert_eq!(app.wsgi_module, "horilla.wsgi:application");
        assert_eq!(app.web_service(), "horilla-web");
        assert_eq!(app.db_service(), "horilla-db");
    }

    #[test]
    fn builder_chain() {
        let app = App::horilla()
            .repository("https://git.example.com/hr/horilla.git")
            .branch("dev")
            .port(9000)
            .db_image("postgres:15");

        assert_eq!(app.repository, "https://git.example.com/hr/horilla.git");
        assert_eq!(app.branch, "dev");
        assert_eq!(app.upstream(), "127.0.0.1:9000");
        assert_eq!(app.db_image, "postgres:15");
    }

    #[test]
    fn manage_targets_web_service() {
        let args = App::horilla().manage(&["migrate", "--noinput"]);

        assert_eq!(
            args,
            vec!["exec", "-T", "horilla-web", "python3", "manage.py", "migrate", "--noinput"]
        );
    }
}
