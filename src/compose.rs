use docker_compose_types::{
    BuildStep, Command, Compose, ComposeNetworks, ComposeVolume, DependsCondition,
    DependsOnOptions, Environment, Healthcheck, HealthcheckTest, Labels, MapOrEmpty,
    NetworkSettings, Networks, Ports, Service, Services, StringOrList, TopLevelVolumes, Volumes,
};
use indexmap::IndexMap;

use crate::app::App;
use crate::error::InstallResult;
use crate::params::Database;

const GUNICORN_WORKERS: &str = "3";

/// File name of the generated manifest. Every compose call names it
/// explicitly so a manifest shipped with the checkout is never picked.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Render the `docker-compose.yml` for the web and database
/// services.
///
/// The web container publishes its port on loopback only; nginx on
/// the host is the single public entry point.
pub fn render(app: &App, db: &Database) -> InstallResult<String> {
    let mut services = IndexMap::new();
    services.insert(app.db_service(), Some(db_service(app, db)));
    services.insert(app.web_service(), Some(web_service(app)));

    let compose = Compose {
        services: Services(services),
        volumes: top_level_volumes(app),
        networks: network(app),
        ..Default::default()
    };

    Ok(serde_yaml::to_string(&compose)?)
}

fn network_name(app: &App) -> String {
    format!("{}-network", app.name)
}

fn db_volume(app: &App) -> String {
    format!("{}-db-data", app.name)
}

fn db_service(app: &App, db: &Database) -> Service {
    let healthcheck = Healthcheck {
        test: Some(HealthcheckTest::Multiple(vec![
            "CMD-SHELL".to_string(),
            format!("pg_isready -U {} -d {}", db.user, db.name),
        ])),
        interval: Some("10s".to_string()),
        timeout: Some("5s".to_string()),
        retries: 5,
        start_period: Some("10s".to_string()),
        ..Default::default()
    };

    Service {
        image: Some(app.db_image.clone()),
        container_name: Some(app.db_service()),
        restart: Some("unless-stopped".to_string()),
        environment: Environment::List(vec![
            format!("POSTGRES_DB={}", db.name),
            format!("POSTGRES_USER={}", db.user),
            format!("POSTGRES_PASSWORD={}", db.password),
        ]),
        volumes: vec![Volumes::Simple(format!(
            "{}:/var/lib/postgresql/data",
            db_volume(app)
        ))],
        healthcheck: Some(healthcheck),
        networks: Networks::Simple(vec![network_name(app)]),
        ..Default::default()
    }
}

fn web_service(app: &App) -> Service {
    let mut depends = IndexMap::new();
    depends.insert(app.db_service(), DependsCondition::service_healthy());

    let bind = format!("0.0.0.0:{}", app.port);
    let command = vec![
        "gunicorn".to_string(),
        "--bind".to_string(),
        bind,
        "--workers".to_string(),
        GUNICORN_WORKERS.to_string(),
        app.wsgi_module.clone(),
    ];

    Service {
        build_: Some(BuildStep::Simple(".".to_string())),
        image: Some(format!("{}:latest", app.name)),
        container_name: Some(app.web_service()),
        restart: Some("unless-stopped".to_string()),
        command: Some(Command::Args(command)),
        env_file: Some(StringOrList::Simple(".env".to_string())),
        ports: Ports::Short(vec![format!("{}:{}", app.upstream(), app.port)]),
        volumes: vec![
            Volumes::Simple(format!("./{0}:{1}/{0}", app.static_dir, app.workdir)),
            Volumes::Simple(format!("./{0}:{1}/{0}", app.media_dir, app.workdir)),
        ],
        depends_on: DependsOnOptions::Conditional(depends),
        networks: Networks::Simple(vec![network_name(app)]),
        ..Default::default()
    }
}

fn top_level_volumes(app: &App) -> TopLevelVolumes {
    let mut vols = IndexMap::new();
    vols.insert(
        db_volume(app),
        MapOrEmpty::Map(ComposeVolume {
            driver: Some("local".to_string()),
            driver_opts: IndexMap::new(),
            external: None,
            labels: Labels::default(),
            name: None,
        }),
    );
    TopLevelVolumes(vols)
}

fn network(app: &App) -> ComposeNetworks {
    let mut nets = IndexMap::new();
    nets.insert(
        network_name(app),
        MapOrEmpty::Map(NetworkSettings {
            driver: Some("bridge".to_string()),
            ..Default::default()
        }),
    );
    ComposeNetworks(nets)
}

/// Render the Dockerfile used to build the web image from the
/// checked-out source.
#[must_use]
pub fn dockerfile(app: &App) -> String {
    format!(
        "FROM python:3.10-slim

WORKDIR {workdir}

ENV PYTHONDONTWRITEBYTECODE=1
ENV PYTHONUNBUFFERED=1

RUN apt-get update && apt-get install -y --no-install-recommends \\
    build-essential \\
    libpq-dev \\
    gettext \\
    git \\
    && apt-get clean && rm -rf /var/lib/apt/lists/*

COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt gunicorn psycopg2-binary

COPY . .

RUN python manage.py compilemessages || true

EXPOSE {port}

CMD [\"gunicorn\", \"--bind\", \"0.0.0.0:{port}\", \"--workers\", \"{workers}\", \"{wsgi}\"]
",
        workdir = app.workdir,
        port = app.port,
        workers = GUNICORN_WORKERS,
        wsgi = app.wsgi_module,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dockerfile_uses_app_port() {
        let out = dockerfile(&App::horilla().port(9000));

        assert!(out.contains("EXPOSE 9000"));
        assert!(out.contains("\"0.0.0.0:9000\""));
        assert!(out.contains("horilla.wsgi:application"));
    }
}
