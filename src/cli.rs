use barn_console_common::{parse_criteria_date, ActivityType};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "barn-console")]
#[command(about = "牛舎カメラ動画の行動イベント閲覧・推論操作コンソール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 接続先サーバURL（設定・環境変数より優先）
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 行動イベント一覧を表示
    Events {
        /// 検索文字列（大文字小文字を区別しない部分一致）
        #[arg(short, long)]
        search: Option<String>,

        /// 日付 (YYYY-MM-DD / YYYYMMDD / YYYY/MM/DD)
        #[arg(short, long, value_parser = parse_criteria_date)]
        date: Option<NaiveDate>,

        /// 行動種別 (brushing/drinking/headbutt)
        #[arg(short, long)]
        activity: Option<ActivityType>,

        /// サーバの代わりにJSONファイルから読み込む
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// 絞り込み結果をファイルに出力（拡張子で形式を判定）
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// 出力形式 (json/excel)
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// アップロード動画一覧と推論状態を表示
    Videos {
        /// サーバの代わりにJSONファイルから読み込む
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// 一覧をファイルに出力
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// 出力形式 (json/excel)
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// 動画をアップロード（フォルダ指定時は直下の.mp4をすべて）
    Upload {
        /// 動画ファイルまたはフォルダ
        #[arg(required = true)]
        path: PathBuf,
    },

    /// 推論を開始
    Infer {
        /// 動画名（一覧の Video Name）
        #[arg(required = true)]
        video: String,
    },

    /// 対話的に絞り込みながら閲覧
    Browse,

    /// 行動イベント・動画を削除
    #[command(group(
        ArgGroup::new("target")
            .required(true)
            .args(["video", "all_events", "all_videos"])
    ))]
    Purge {
        /// 指定動画のイベントを削除
        #[arg(long)]
        video: Option<String>,

        /// すべてのイベントを削除
        #[arg(long)]
        all_events: bool,

        /// すべての動画を削除
        #[arg(long)]
        all_videos: bool,

        /// 確認せずに実行
        #[arg(short, long)]
        yes: bool,
    },

    /// 設定を表示/編集
    Config {
        /// サーバURLを設定
        #[arg(long)]
        set_server_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 削除対象
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurgeTarget {
    VideoEvents(String),
    AllEvents,
    AllVideos,
}

impl PurgeTarget {
    pub fn from_flags(video: Option<String>, all_events: bool, all_videos: bool) -> Option<Self> {
        match (video, all_events, all_videos) {
            (Some(name), _, _) => Some(PurgeTarget::VideoEvents(name)),
            (None, true, _) => Some(PurgeTarget::AllEvents),
            (None, false, true) => Some(PurgeTarget::AllVideos),
            _ => None,
        }
    }

    /// 確認プロンプトの文言
    pub fn describe(&self) -> String {
        match self {
            PurgeTarget::VideoEvents(name) => format!("動画 {} のイベント", name),
            PurgeTarget::AllEvents => "すべての行動イベント".to_string(),
            PurgeTarget::AllVideos => "すべてのアップロード動画".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Excel,
}

impl ExportFormat {
    /// 拡張子から判定（不明ならJSON）
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(format!("Unknown format: {}. Use json or excel", s)),
        }
    }
}
