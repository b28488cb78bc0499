//! Static HTML rendering of the current view.
//!
//! The output mirrors what the terminal shows: one header cell per discovered
//! column with its filter controls, the rows of the current page and the
//! pagination buttons. Controls carry their current state but no scripts.

use crate::filter::{FilterMode, FilterOperator};
use crate::model::Model;
use crate::source::LoadState;

const PAGE_TITLE: &str = "Data Grid";

/// A complete HTML document around [`render_component`].
pub fn render_page(model: &Model) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{PAGE_TITLE}</title>\n</head>\n<body>\n<h1>{PAGE_TITLE}</h1>\n{}</body>\n</html>\n",
        render_component(model)
    )
}

pub fn render_component(model: &Model) -> String {
    match model.load_state() {
        LoadState::Failed(msg) => format!("<div class=\"error\">Error: {}</div>\n", escape(msg)),
        LoadState::Loading => "<div class=\"loading\">Loading ...</div>\n".to_string(),
        LoadState::Ready(_) => render_grid(model),
    }
}

fn render_grid(model: &Model) -> String {
    let view = model.view();
    let filters = model.filters();
    let mode = model.filter_mode();
    let mut out = String::new();

    out.push_str("<div class=\"grid\">\n");
    if mode == FilterMode::Global {
        out.push_str(&format!(
            "<input type=\"text\" name=\"query\" placeholder=\"Search...\" value=\"{}\">\n",
            escape(filters.query())
        ));
    }

    out.push_str("<table>\n<thead>\n<tr>\n");
    for column in &view.columns {
        let arrow = if model.sort().is_active(column) {
            format!(" {}", model.sort().direction.arrow())
        } else {
            String::new()
        };
        out.push_str(&format!(
            "<th data-column=\"{}\"><span>{}{arrow}</span>",
            escape(column),
            escape(column)
        ));
        if mode == FilterMode::Columns {
            let current = filters.operator_tag(column);
            out.push_str(&format!("<select name=\"operator-{}\">", escape(column)));
            for op in FilterOperator::ALL {
                let selected = if op.tag() == current { " selected" } else { "" };
                out.push_str(&format!(
                    "<option value=\"{}\"{selected}>{}</option>",
                    op.tag(),
                    op.label()
                ));
            }
            out.push_str(&format!(
                "</select><input type=\"text\" name=\"filter-{}\" placeholder=\"Filter {}...\" value=\"{}\">",
                escape(column),
                escape(column),
                escape(filters.value(column))
            ));
        }
        out.push_str("</th>\n");
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &view.page_rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");

    let disabled = |flag: bool| if flag { "" } else { " disabled" };
    out.push_str(&format!(
        "<div class=\"pager\"><button name=\"previous\"{}>Previous</button><span>Page {} of {}</span><button name=\"next\"{}>Next</button></div>\n",
        disabled(view.has_previous),
        view.page,
        view.total_pages,
        disabled(view.has_next)
    ));
    out.push_str("</div>\n");
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
