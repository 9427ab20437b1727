//! One-shot month summary for the terminal

use nu_ansi_term::{Color, Style};
use rota_core::view::DayView;
use rota_core::{AvailabilityPage, ColorCategory, MonthView, NoticeLevel, WeekRequirement, YearMonth};

fn category_color(category: ColorCategory) -> Color {
    match category {
        ColorCategory::Primary => Color::Blue,
        ColorCategory::Secondary => Color::Purple,
        ColorCategory::Success => Color::Green,
        ColorCategory::Warning => Color::Yellow,
    }
}

/// Load `month` and print it
pub async fn print_month(mut page: AvailabilityPage, month: YearMonth) -> anyhow::Result<()> {
    page.go_to(month).await;

    let view = page.month_view();
    let mut failed = false;
    for notice in page.take_notices() {
        match notice.level {
            NoticeLevel::Info => eprintln!("{}", Style::new().dimmed().paint(notice.message)),
            NoticeLevel::Error => {
                failed = true;
                eprintln!("{}", Color::Red.paint(notice.message));
            }
        }
    }

    print!("{}", render_summary(&view));

    if failed {
        anyhow::bail!("Could not load {}", view.title);
    }
    Ok(())
}

fn render_day(day: &DayView) -> String {
    let text = format!("{:>3}", day.day.day_number());
    if !day.day.in_month {
        return Style::new().dimmed().paint(text).to_string();
    }
    let style = match day.selection {
        Some(option) => category_color(option.color()).bold(),
        None => Style::new(),
    };
    let style = if day.day.is_today { style.underline() } else { style };
    style.paint(text).to_string()
}

fn render_count(count: u32, required: u32, met: bool) -> String {
    let text = format!("{}/{}", count, required);
    if met {
        Color::Green.paint(text).to_string()
    } else {
        Color::Red.paint(text).to_string()
    }
}

fn render_requirement(requirement: &WeekRequirement) -> String {
    let mut text = format!(
        "   weekdays {}  weekend {}",
        render_count(requirement.weekday.count, requirement.weekday.required, requirement.weekday.met),
        render_count(requirement.weekend.count, requirement.weekend.required, requirement.weekend.met),
    );
    if requirement.partial {
        text.push_str(&format!("  {}", Style::new().dimmed().paint("(partial week)")));
    }
    text
}

/// Month grid with per-week coverage, legend and statistics
pub fn render_summary(view: &MonthView) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} - {}\n\n",
        Color::Cyan.bold().paint(view.title.as_str()),
        view.owner_name()
    ));
    out.push_str(" Mon Tue Wed Thu Fri Sat Sun\n");

    for week in &view.weeks {
        for day in &week.days {
            out.push(' ');
            out.push_str(&render_day(day));
        }
        out.push_str(&render_requirement(&week.requirement));
        out.push('\n');
    }

    out.push_str(&format!("\n{} of {} weeks covered\n", view.complete_weeks(), view.weeks.len()));

    let legend: Vec<String> = view
        .options
        .iter()
        .map(|o| category_color(o.color).bold().paint(o.label).to_string())
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));

    if let Some(heading) = &view.statistics.heading {
        out.push_str(&format!("\n{}\n", Style::new().bold().paint(heading.as_str())));
    }
    match &view.statistics.statistics {
        Some(stats) => out.push_str(&format!(
            "  Total duty days: {}\n  Leave taken:     {}\n  Upcoming leave:  {}\n",
            stats.total_duty_days, stats.leave_taken, stats.upcoming_leave
        )),
        None => out.push_str("  No statistics available\n"),
    }

    out
}
