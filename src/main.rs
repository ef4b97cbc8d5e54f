use barn_console::{browse, cli, client, config, error, export, scanner, session, table};
use barn_console_common::{MediaLocator, Record};
use clap::Parser;
use cli::{Cli, Commands, ExportFormat, PurgeTarget};
use client::HttpBackend;
use config::Config;
use dialoguer::Confirm;
use error::{ConsoleError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use session::Session;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "barn_console=info,barn_console_common=info";
const VERBOSE_LOG_FILTER: &str = "barn_console=debug,barn_console_common=debug";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let server_url = cli.server.clone().unwrap_or_else(|| config.server_url());
    tracing::debug!(server = %server_url, "configuration loaded");

    let backend = HttpBackend::new(&server_url, Duration::from_secs(config.timeout_seconds))?;
    let mut session = Session::new(backend, MediaLocator::new(server_url.as_str()));

    match cli.command {
        Commands::Events { search, date, activity, from_file, export, format } => {
            match from_file {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)?;
                    session.load_events(content);
                }
                None => {
                    session.refresh_events().await?;
                }
            }

            if let Some(search) = search {
                session.set_search(search);
            }
            session.set_date(date);
            session.set_activity_type(activity);

            let rows = session.event_rows();
            println!("{}", table::render_activity(&rows));
            println!("{} / {}件", rows.len(), session.events().len());

            if let Some(output) = export {
                let format = format.unwrap_or_else(|| ExportFormat::from_path(&output));
                let visible = session.visible_events();
                export::export_events(&visible, &rows, format, &output)?;
            }
        }

        Commands::Videos { from_file, export, format } => {
            match from_file {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)?;
                    session.load_videos(content);
                }
                None => {
                    session.refresh_videos().await?;
                }
            }

            let rows = session.video_rows();
            println!("{}", table::render_videos(&rows));
            println!("{}件", rows.len());

            if let Some(output) = export {
                let format = format.unwrap_or_else(|| ExportFormat::from_path(&output));
                let records: Vec<&Record> = session.videos().iter().rev().collect();
                export::export_videos(&records, &rows, format, &output)?;
            }
        }

        Commands::Upload { path } => {
            println!("📤 barn-console - 動画アップロード\n");
            run_upload(&mut session, &path).await?;
        }

        Commands::Infer { video } => {
            println!("🐄 barn-console - 推論\n");
            session.refresh_videos().await?;

            let spinner = spinner(format!("推論中: {}", video));
            let result = session.run_inference(&video).await;
            spinner.finish_and_clear();

            let state = result?;
            println!("✔ 推論リクエスト完了: {} ({})", video, state);
            if let Some(row) = session.video_rows().into_iter().find(|r| r.video_name == video) {
                if !row.preview_url.is_empty() {
                    println!("  プレビュー: {}", row.preview_url);
                }
            }
        }

        Commands::Browse => {
            browse::run_browse(&mut session).await?;
        }

        Commands::Purge { video, all_events, all_videos, yes } => {
            let target = PurgeTarget::from_flags(video, all_events, all_videos)
                .ok_or_else(|| ConsoleError::Config("削除対象を指定してください".into()))?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("{}を削除しますか？", target.describe()))
                    .default(false)
                    .interact()
                    .map_err(|e| ConsoleError::Prompt(e.to_string()))?;
                if !confirmed {
                    println!("中止しました");
                    return Ok(());
                }
            }

            match &target {
                PurgeTarget::VideoEvents(name) => session.purge_video_events(name).await?,
                PurgeTarget::AllEvents => session.purge_all_events().await?,
                PurgeTarget::AllVideos => session.purge_all_videos().await?,
            }
            println!("✔ {}を削除しました", target.describe());
        }

        Commands::Config { set_server_url, show } => {
            let mut config = config;

            if let Some(url) = set_server_url {
                config.set_server_url(url)?;
                println!("✔ サーバURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  サーバURL: {}", config.server_url);
                println!("  接続先（有効値）: {}", config.server_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                if let Ok(path) = Config::config_path() {
                    println!("  設定ファイル: {}", path.display());
                }
            }
        }
    }

    Ok(())
}

async fn run_upload(session: &mut Session<HttpBackend>, path: &Path) -> Result<()> {
    let videos = scanner::collect_videos(path)?;
    println!("✔ {}本の動画を検出\n", videos.len());

    let progress = ProgressBar::new(videos.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut failures = 0usize;
    for video in &videos {
        progress.set_message(video.file_name.clone());
        match session.upload(&video.path).await {
            Ok(name) => progress.println(format!("✔ {}", name)),
            Err(e) => {
                failures += 1;
                progress.println(format!("✗ {}: {}", video.file_name, e));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if failures > 0 {
        return Err(ConsoleError::Upload(format!(
            "{}本中{}本が失敗しました",
            videos.len(),
            failures
        )));
    }

    println!("\n✅ アップロード完了（動画一覧: {}件）", session.videos().len());
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
