//! Server-side HTML rendering
//!
//! Both layouts render from the same [`MonthView`]; they differ only in
//! arrangement.

use rota_core::view::{DayView, OptionView, StatisticsPanel, WeekView};
use rota_core::{FilterType, MonthView, NoticeLevel, WeekRequirement};
use serde::Deserialize;

const WEEKDAY_HEADERS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Page arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Seven-column month table
    #[default]
    Desktop,
    /// One list per week for narrow screens
    Compact,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Desktop => "desktop",
            Layout::Compact => "compact",
        }
    }

    /// Where form posts send the browser back to
    pub fn home(&self) -> String {
        match self {
            Layout::Desktop => "/".to_string(),
            Layout::Compact => "/?layout=compact".to_string(),
        }
    }
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn hidden_layout(layout: Layout) -> String {
    format!(r#"<input type="hidden" name="layout" value="{}">"#, layout.as_str())
}

/// Render the full page
pub fn render_page(view: &MonthView, layout: Layout) -> String {
    let mut html = String::with_capacity(32 * 1024);

    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Availability - {}</title>\n<style>{}</style>\n</head>\n<body class=\"{}\">\n",
        escape(&view.title),
        STYLE,
        layout.as_str()
    ));

    html.push_str(&render_header(view, layout));
    html.push_str("<div class=\"container\">\n");

    for notice in &view.notices {
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        html.push_str(&format!(
            "<div class=\"notice notice-{}\">{}</div>\n",
            level,
            escape(&notice.message)
        ));
    }

    if view.viewer.is_admin {
        html.push_str(&render_staff_selector(view, layout));
    }
    if !view.editable {
        html.push_str(&format!(
            "<p class=\"read-only\">Viewing {}'s availability (read-only)</p>\n",
            escape(view.owner_name())
        ));
    }
    if view.loading {
        html.push_str("<p class=\"loading\">Loading...</p>\n");
    }

    match layout {
        Layout::Desktop => html.push_str(&render_desktop(view, layout)),
        Layout::Compact => html.push_str(&render_compact(view, layout)),
    }

    if view.editable {
        html.push_str(&format!(
            "<form method=\"post\" action=\"/save\" class=\"save-month\">{}<button>Save month</button></form>\n",
            hidden_layout(layout)
        ));
    }

    html.push_str(&render_statistics(&view.statistics, layout));
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_header(view: &MonthView, layout: Layout) -> String {
    format!(
        "<header>\n\
         <form method=\"post\" action=\"/month/previous\">{hidden}<button title=\"{prev}\">&larr;</button></form>\n\
         <h1>{title}</h1>\n\
         <form method=\"post\" action=\"/month/next\">{hidden}<button title=\"{next}\">&rarr;</button></form>\n\
         <span class=\"owner\">{owner}</span>\n\
         <nav><a href=\"/?layout=desktop\">Desktop</a> | <a href=\"/?layout=compact\">Compact</a></nav>\n\
         </header>\n",
        hidden = hidden_layout(layout),
        prev = escape(&view.previous.title()),
        next = escape(&view.next.title()),
        title = escape(&view.title),
        owner = escape(view.owner_name()),
    )
}

fn render_staff_selector(view: &MonthView, layout: Layout) -> String {
    let viewed = view.viewed_user.as_ref().map(|u| u.id);
    let mut options = String::from("<option value=\"\">My calendar</option>");
    for user in view.staff.iter().filter(|u| u.id != view.viewer.id) {
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            user.id,
            if viewed == Some(user.id) { " selected" } else { "" },
            escape(&user.name)
        ));
    }
    format!(
        "<form method=\"post\" action=\"/staff\" class=\"staff\">{}<label>Staff <select name=\"user_id\">{}</select></label><button>View</button></form>\n",
        hidden_layout(layout),
        options
    )
}

fn render_requirement(requirement: &WeekRequirement) -> String {
    let partial = if requirement.partial {
        " <span class=\"partial\">(partial week)</span>"
    } else {
        ""
    };
    format!(
        "<div class=\"requirement {}\"><span class=\"{}\">Weekdays {}/{}</span> <span class=\"{}\">Weekend {}/{}</span>{}</div>",
        if requirement.complete { "complete" } else { "incomplete" },
        if requirement.weekday.met { "met" } else { "unmet" },
        requirement.weekday.count,
        requirement.weekday.required,
        if requirement.weekend.met { "met" } else { "unmet" },
        requirement.weekend.count,
        requirement.weekend.required,
        partial,
    )
}

fn day_classes(day: &DayView) -> String {
    let mut classes = vec!["day"];
    if !day.day.in_month {
        classes.push("outside");
    }
    if day.day.is_weekend {
        classes.push("weekend");
    }
    if day.day.is_past {
        classes.push("past");
    }
    if day.day.is_today {
        classes.push("today");
    }
    if day.day.is_disabled {
        classes.push("disabled");
    }
    if day.saving {
        classes.push("saving");
    }
    classes.join(" ")
}

/// Option buttons for an editable day, or a read-only label
fn render_day_body(day: &DayView, options: &[OptionView], layout: Layout) -> String {
    let mut body = String::new();
    if day.editable {
        body.push_str(&format!(
            "<form method=\"post\" action=\"/select\" class=\"options\">{}<input type=\"hidden\" name=\"date\" value=\"{}\">",
            hidden_layout(layout),
            day.key
        ));
        for option in options {
            let checked = day.selection.map(|s| s.id()) == Some(option.id);
            body.push_str(&format!(
                "<button name=\"option\" value=\"{}\" class=\"option option-{}{}\">{}</button>",
                option.id,
                option.color.as_str(),
                if checked { " checked" } else { "" },
                option.label
            ));
        }
        if day.selection.is_some() {
            body.push_str("<button name=\"option\" value=\"\" class=\"option clear\">Clear</button>");
        }
        body.push_str("</form>");
    } else if day.day.in_month {
        body.push_str(&format!("<span class=\"selection\">{}</span>", day.selection_label()));
    }
    if day.saving {
        body.push_str("<span class=\"saving-indicator\">Saving...</span>");
    }
    body
}

fn render_desktop(view: &MonthView, layout: Layout) -> String {
    let mut html = String::from("<table class=\"calendar desktop\">\n<thead><tr>");
    for header in WEEKDAY_HEADERS {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("<th>Coverage</th></tr></thead>\n<tbody>\n");

    for week in &view.weeks {
        html.push_str("<tr>");
        for day in &week.days {
            html.push_str(&format!(
                "<td class=\"{}\"><div class=\"day-number\">{}</div>{}</td>",
                day_classes(day),
                day.day.day_number(),
                render_day_body(day, &view.options, layout)
            ));
        }
        html.push_str(&format!("<td>{}</td></tr>\n", render_requirement(&week.requirement)));
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn render_compact_week(week: &WeekView, options: &[OptionView], layout: Layout) -> String {
    let mut html = format!(
        "<section class=\"week\"><h3>Week of {}</h3>{}<ul>",
        week.requirement.week_start.format("%b %-d"),
        render_requirement(&week.requirement)
    );
    for day in week.days.iter().filter(|d| d.day.in_month) {
        html.push_str(&format!(
            "<li class=\"{}\"><span class=\"day-label\">{}</span>{}</li>",
            day_classes(day),
            day.day.date.format("%a %-d"),
            render_day_body(day, options, layout)
        ));
    }
    html.push_str("</ul></section>\n");
    html
}

fn render_compact(view: &MonthView, layout: Layout) -> String {
    let mut html = format!(
        "<div class=\"calendar compact\">\n<p class=\"summary\">{} of {} weeks covered</p>\n",
        view.complete_weeks(),
        view.weeks.len()
    );
    for week in &view.weeks {
        html.push_str(&render_compact_week(week, &view.options, layout));
    }
    html.push_str("</div>\n");
    html
}

fn render_statistics(panel: &StatisticsPanel, layout: Layout) -> String {
    let mut html = String::from("<section class=\"statistics\">\n<h2>Statistics</h2>\n");

    html.push_str(&format!("<form method=\"post\" action=\"/filter\" class=\"filters\">{}", hidden_layout(layout)));
    for filter in [FilterType::Month, FilterType::Year, FilterType::Custom] {
        html.push_str(&format!(
            "<button name=\"filter_type\" value=\"{}\"{}>{}</button>",
            filter.as_str(),
            if panel.filter_type == filter { " class=\"active\"" } else { "" },
            match filter {
                FilterType::Month => "This month",
                FilterType::Year => "This year",
                FilterType::Custom => "Custom range",
            }
        ));
    }
    html.push_str("</form>\n");

    if panel.filter_type == FilterType::Custom {
        let value = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        html.push_str(&format!(
            "<form method=\"post\" action=\"/filter\" class=\"custom-range\">{}\
             <input type=\"hidden\" name=\"filter_type\" value=\"custom\">\
             <label>From <input type=\"date\" name=\"start_date\" value=\"{}\"></label>\
             <label>To <input type=\"date\" name=\"end_date\" value=\"{}\"></label>\
             <button name=\"confirm\" value=\"1\">Apply</button></form>\n",
            hidden_layout(layout),
            value(panel.custom_start),
            value(panel.custom_end)
        ));
    }

    if let Some(heading) = &panel.heading {
        html.push_str(&format!("<h3>{}</h3>\n", escape(heading)));
    }

    match &panel.statistics {
        Some(stats) => html.push_str(&format!(
            "<dl>\n<dt>Total duty days</dt><dd>{}</dd>\n<dt>Leave taken</dt><dd>{}</dd>\n<dt>Upcoming leave</dt><dd>{}</dd>\n</dl>\n",
            stats.total_duty_days, stats.leave_taken, stats.upcoming_leave
        )),
        None => html.push_str("<p class=\"empty\">No statistics available</p>\n"),
    }

    if panel.heading.is_some() {
        html.push_str(&format!(
            "<form method=\"post\" action=\"/statistics/recompute\">{}<button>Recompute</button></form>\n",
            hidden_layout(layout)
        ));
    }

    html.push_str("</section>\n");
    html
}

const STYLE: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; color: #333; line-height: 1.5; }
header { background: #2c3e50; color: white; padding: 16px 20px; display: flex; gap: 12px; align-items: center; flex-wrap: wrap; }
header h1 { font-size: 22px; }
header nav a, header .owner { color: #ecf0f1; }
header button { background: none; border: 1px solid #ecf0f1; color: white; padding: 2px 10px; border-radius: 4px; cursor: pointer; }
.container { max-width: 1200px; margin: 0 auto; padding: 20px; }
.notice { padding: 10px 14px; border-radius: 4px; margin-bottom: 10px; }
.notice-info { background: #d1ecf1; color: #0c5460; }
.notice-error { background: #f8d7da; color: #721c24; }
.read-only, .loading { color: #666; margin-bottom: 10px; }
table.calendar { width: 100%; border-collapse: collapse; background: white; }
table.calendar th, table.calendar td { border: 1px solid #eee; padding: 6px; vertical-align: top; }
.day.outside { background: #fafafa; color: #bbb; }
.day.weekend { background: #fdf6e3; }
.day.today { outline: 2px solid #3498db; }
.day.disabled .day-number { color: #aaa; }
.options { display: flex; flex-direction: column; gap: 2px; }
.option { border: 1px solid #ccc; background: white; border-radius: 3px; font-size: 12px; cursor: pointer; }
.option.checked.option-primary { background: #3498db; color: white; }
.option.checked.option-secondary { background: #7f8c8d; color: white; }
.option.checked.option-success { background: #27ae60; color: white; }
.option.checked.option-warning { background: #f39c12; color: white; }
.requirement .met { color: #27ae60; }
.requirement .unmet { color: #c0392b; }
.requirement .partial { color: #7f8c8d; font-style: italic; }
.compact .week { background: white; margin-bottom: 12px; padding: 10px; border-radius: 6px; }
.compact li { list-style: none; padding: 6px 0; border-top: 1px solid #eee; }
.statistics { background: white; margin-top: 20px; padding: 16px; border-radius: 6px; }
.filters .active { font-weight: bold; }
.save-month { margin-top: 12px; }
"#;
