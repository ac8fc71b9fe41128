use std::path::{Path, PathBuf};

use crate::app::App;
use crate::compose::COMPOSE_FILE;
use crate::params::Database;

use super::LOCAL_RETENTION;

/// Inputs of the backup shell script.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub app: &'a App,
    pub install_dir: &'a Path,
    pub database: &'a Database,
    /// Compose invocation, e.g. `docker compose`.
    pub compose: &'a str,
    /// rclone destination, e.g. `horilla-backup:bucket`.
    pub target: &'a str,
}

/// Where the script lives inside the install directory.
#[must_use]
pub fn script_path(install_dir: &Path) -> PathBuf {
    install_dir.join("backups").join("backup.sh")
}

/// Render the backup script: database dump, application archive,
/// upload, local retention.
#[must_use]
pub fn render(ctx: &ScriptContext<'_>) -> String {
    let install_dir = ctx.install_dir.display();
    let backup_dir = ctx.install_dir.join("backups");
    let backup_dir = backup_dir.display();
    let keep_from = LOCAL_RETENTION + 1;

    format!(
        r#"#!/bin/bash
# Horilla HRMS backup
set -euo pipefail

TIMESTAMP=$(date +%Y-%m-%d_%H-%M-%S)
BACKUP_DIR="{backup_dir}"
INSTALL_DIR="{install_dir}"
TARGET="{target}"

mkdir -p "$BACKUP_DIR"
cd "$INSTALL_DIR"

echo "Backing up PostgreSQL database..."
{compose} -f {compose_file} exec -T {db_service} pg_dump -U {db_user} -d {db_name} > "$BACKUP_DIR/horilla_db_$TIMESTAMP.sql"
gzip "$BACKUP_DIR/horilla_db_$TIMESTAMP.sql"

echo "Backing up application files..."
tar -czf "$BACKUP_DIR/horilla_files_$TIMESTAMP.tar.gz" -C "$INSTALL_DIR" \
    --exclude="./backups" \
    --exclude="./{static_dir}" \
    --exclude="./media/cache" \
    --exclude="__pycache__" \
    .

echo "Uploading to remote storage..."
rclone copy "$BACKUP_DIR/horilla_db_$TIMESTAMP.sql.gz" "$TARGET/horilla-backups/database/"
rclone copy "$BACKUP_DIR/horilla_files_$TIMESTAMP.tar.gz" "$TARGET/horilla-backups/files/"

echo "Cleaning up old local backups..."
cd "$BACKUP_DIR"
ls -t horilla_db_*.sql.gz | tail -n +{keep_from} | xargs -r rm --
ls -t horilla_files_*.tar.gz | tail -n +{keep_from} | xargs -r rm --

echo "Backup completed at $(date)"
"#,
        target = ctx.target,
        compose = ctx.compose,
        compose_file = COMPOSE_FILE,
        db_service = ctx.app.db_service(),
        db_user = ctx.database.user,
        db_name = ctx.database.name,
        static_dir = ctx.app.static_dir,
    )
}

/// Cron line running the script on `schedule`, logging next to it.
#[must_use]
pub fn cron_line(schedule: &str, script: &Path) -> String {
    let log = script.with_extension("log");
    format!("{schedule} {} >> {} 2>&1", script.display(), log.display())
}
