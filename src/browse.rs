//! 対話式の閲覧モード
//!
//! 行動イベント表を表示し、メニューから絞り込み条件を変える。
//! 「すべてのフィルタをクリア」は条件が1つ以上あるときだけ出す。

use crate::client::Backend;
use crate::error::{ConsoleError, Result};
use crate::session::Session;
use crate::table;
use barn_console_common::{filter, parse_criteria_date, ActivityType, Criteria};
use dialoguer::{Input, Select};

/// メニュー項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseAction {
    Search,
    Date,
    Activity,
    ClearFilters,
    ShowVideos,
    StartInference,
    Refresh,
    Quit,
}

impl BrowseAction {
    pub fn label(&self) -> &'static str {
        match self {
            BrowseAction::Search => "検索文字列を設定",
            BrowseAction::Date => "日付を設定",
            BrowseAction::Activity => "行動種別を設定",
            BrowseAction::ClearFilters => "すべてのフィルタをクリア",
            BrowseAction::ShowVideos => "アップロード動画を表示",
            BrowseAction::StartInference => "推論を開始",
            BrowseAction::Refresh => "再取得",
            BrowseAction::Quit => "終了",
        }
    }
}

/// 現在の条件に応じたメニュー
pub fn menu_actions(criteria: &Criteria, has_requestable_video: bool) -> Vec<BrowseAction> {
    let mut actions = vec![BrowseAction::Search, BrowseAction::Date, BrowseAction::Activity];
    if criteria.can_clear() {
        actions.push(BrowseAction::ClearFilters);
    }
    actions.push(BrowseAction::ShowVideos);
    if has_requestable_video {
        actions.push(BrowseAction::StartInference);
    }
    actions.push(BrowseAction::Refresh);
    actions.push(BrowseAction::Quit);
    actions
}

/// 条件の要約（未設定なら `None`）
pub fn describe_criteria(criteria: &Criteria) -> Option<String> {
    if !criteria.is_active() {
        return None;
    }
    let mut parts = Vec::new();
    if !criteria.search.trim().is_empty() {
        parts.push(format!("検索=\"{}\"", criteria.search));
    }
    if let Some(date) = criteria.date {
        parts.push(format!("日付={}", filter::format_day(date)));
    }
    if let Some(activity) = criteria.activity_type {
        parts.push(format!("種別={}", activity));
    }
    Some(parts.join(" "))
}

pub async fn run_browse<B: Backend>(session: &mut Session<B>) -> Result<()> {
    if let Err(e) = session.refresh_all().await {
        println!("⚠ {}", e);
    }

    loop {
        print_events(session);

        let requestable: Vec<String> = session
            .video_rows()
            .into_iter()
            .filter(|r| r.action_enabled())
            .map(|r| r.video_name)
            .collect();

        let actions = menu_actions(session.criteria(), !requestable.is_empty());
        let labels: Vec<&str> = actions.iter().map(BrowseAction::label).collect();
        let selected = Select::new()
            .with_prompt("操作")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        match actions[selected] {
            BrowseAction::Search => {
                let search: String = Input::new()
                    .with_prompt("検索文字列（空で解除）")
                    .with_initial_text(session.criteria().search.clone())
                    .allow_empty(true)
                    .interact_text()
                    .map_err(prompt_error)?;
                session.set_search(search);
            }
            BrowseAction::Date => {
                let date = prompt_date()?;
                session.set_date(date);
            }
            BrowseAction::Activity => {
                let activity = prompt_activity()?;
                session.set_activity_type(activity);
            }
            BrowseAction::ClearFilters => {
                if session.clear_filters() {
                    println!("✓ フィルタをクリアしました");
                }
            }
            BrowseAction::ShowVideos => {
                println!("\n{}", table::render_videos(&session.video_rows()));
            }
            BrowseAction::StartInference => {
                let selected = Select::new()
                    .with_prompt("推論する動画")
                    .items(&requestable)
                    .default(0)
                    .interact()
                    .map_err(prompt_error)?;
                let name = &requestable[selected];
                println!("⏳ 推論中: {}", name);
                match session.run_inference(name).await {
                    Ok(state) => println!("✓ {} → {}", name, state),
                    Err(e) => println!("✗ {}", e),
                }
            }
            BrowseAction::Refresh => {
                if let Err(e) = session.refresh_all().await {
                    println!("⚠ {}（表示中のデータを残します）", e);
                }
            }
            BrowseAction::Quit => break,
        }
    }

    Ok(())
}

fn print_events<B: Backend>(session: &Session<B>) {
    let rows = session.event_rows();
    println!("\n{}", table::render_activity(&rows));
    match describe_criteria(session.criteria()) {
        Some(summary) => println!("{} / {}件  [{}]", rows.len(), session.events().len(), summary),
        None => println!("{}件", rows.len()),
    }
}

fn prompt_date() -> Result<Option<chrono::NaiveDate>> {
    let input: String = Input::new()
        .with_prompt("日付 YYYY-MM-DD（空で解除）")
        .allow_empty(true)
        .validate_with(|value: &String| -> std::result::Result<(), String> {
            if value.trim().is_empty() {
                Ok(())
            } else {
                parse_criteria_date(value).map(|_| ())
            }
        })
        .interact_text()
        .map_err(prompt_error)?;

    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_criteria_date(&input)
        .map(Some)
        .map_err(ConsoleError::Prompt)
}

fn prompt_activity() -> Result<Option<ActivityType>> {
    let mut labels = vec!["(指定なし)"];
    labels.extend(ActivityType::ALL.iter().map(|t| t.as_str()));
    let selected = Select::new()
        .with_prompt("行動種別")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    Ok(selected
        .checked_sub(1)
        .and_then(|i| ActivityType::ALL.get(i).copied()))
}

fn prompt_error(e: dialoguer::Error) -> ConsoleError {
    ConsoleError::Prompt(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_clear_hidden_when_idle() {
        let actions = menu_actions(&Criteria::new(), false);
        assert!(!actions.contains(&BrowseAction::ClearFilters));
        assert!(!actions.contains(&BrowseAction::StartInference));
        assert_eq!(actions.last(), Some(&BrowseAction::Quit));
    }

    #[test]
    fn test_clear_shown_when_any_criterion_set() {
        let criteria = Criteria::new().with_search("cam");
        assert!(menu_actions(&criteria, false).contains(&BrowseAction::ClearFilters));

        let criteria = Criteria::new().with_activity_type(ActivityType::Drinking);
        assert!(menu_actions(&criteria, true).contains(&BrowseAction::ClearFilters));
    }

    #[test]
    fn test_inference_entry_when_requestable() {
        assert!(menu_actions(&Criteria::new(), true).contains(&BrowseAction::StartInference));
    }

    #[test]
    fn test_describe_criteria() {
        assert_eq!(describe_criteria(&Criteria::new()), None);
        let criteria = Criteria::new()
            .with_search("cam")
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .with_activity_type(ActivityType::Headbutt);
        assert_eq!(
            describe_criteria(&criteria).as_deref(),
            Some("検索=\"cam\" 日付=2024-03-01 種別=Headbutt")
        );
    }
}
