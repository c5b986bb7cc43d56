//! Admin tables and record forms.

use maud::{html, Markup};

use openalt_core::models::{AlternativeSummary, CategorySummary, ToolPayload};
use openalt_core::store::CatalogCounts;

use crate::admin::{AlternativeForm, CategoryForm, ToolForm};
use crate::dates::format_date;

pub fn dashboard(counts: &CatalogCounts) -> Markup {
    html! {
        h1 { "Dashboard" }
        table {
            tbody {
                tr {
                    th { a href="/admin/tools" { "Tools" } }
                    td { (counts.tools) " (" (counts.published_tools) " published)" }
                }
                tr {
                    th { a href="/admin/alternatives" { "Alternatives" } }
                    td { (counts.alternatives) }
                }
                tr {
                    th { a href="/admin/categories" { "Categories" } }
                    td { (counts.categories) }
                }
            }
        }
    }
}

fn delete_button(action: &str) -> Markup {
    html! {
        form method="post" action=(action) style="display:inline"
            onsubmit="return confirm('Delete this record?');" {
            button type="submit" { "Delete" }
        }
    }
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            p.error role="alert" { (message) }
        }
    }
}

pub fn tools_table(tools: &[ToolPayload], now: i64) -> Markup {
    html! {
        h1 { "Tools" }
        p { a href="/admin/tools/new" { "New tool" } }
        table {
            thead { tr { th { "Name" } th { "Score" } th { "Published" } th { "Categories" } th {} } }
            tbody {
                @for p in tools {
                    tr {
                        td { a href={ "/admin/tools/" (p.tool.id) "/edit" } { (p.tool.name) } }
                        td { (p.tool.score) }
                        td {
                            @match p.tool.published_at {
                                Some(ts) if p.tool.is_published(now) => { (format_date(ts)) }
                                Some(ts) => { "scheduled " (format_date(ts)) }
                                None => { span.muted { "draft" } }
                            }
                        }
                        td {
                            @for (i, c) in p.categories.iter().enumerate() {
                                @if i > 0 { ", " }
                                (c.name)
                            }
                        }
                        td { (delete_button(&format!("/admin/tools/{}/delete", p.tool.id))) }
                    }
                }
            }
        }
    }
}

pub fn alternatives_table(alternatives: &[AlternativeSummary]) -> Markup {
    html! {
        h1 { "Alternatives" }
        p { a href="/admin/alternatives/new" { "New alternative" } }
        table {
            thead { tr { th { "Name" } th { "Website" } th { "Published tools" } th {} } }
            tbody {
                @for a in alternatives {
                    tr {
                        td { a href={ "/admin/alternatives/" (a.alternative.id) "/edit" } { (a.alternative.name) } }
                        td { (a.alternative.website) }
                        td { (a.tool_count) }
                        td { (delete_button(&format!("/admin/alternatives/{}/delete", a.alternative.id))) }
                    }
                }
            }
        }
    }
}

pub fn categories_table(categories: &[CategorySummary]) -> Markup {
    html! {
        h1 { "Categories" }
        p { a href="/admin/categories/new" { "New category" } }
        table {
            thead { tr { th { "Name" } th { "Label" } th { "Published tools" } th {} } }
            tbody {
                @for c in categories {
                    tr {
                        td { a href={ "/admin/categories/" (c.category.id) "/edit" } { (c.category.name) } }
                        td { (c.category.label.as_deref().unwrap_or("")) }
                        td { (c.tool_count) }
                        td { (delete_button(&format!("/admin/categories/{}/delete", c.category.id))) }
                    }
                }
            }
        }
    }
}

/// Create/edit form for a tool. `action` is the POST target.
pub fn tool_form(
    heading: &str,
    action: &str,
    form: &ToolForm,
    categories: &[CategorySummary],
    alternatives: &[AlternativeSummary],
    error: Option<&str>,
) -> Markup {
    html! {
        h1 { (heading) }
        (error_banner(error))
        form.record method="post" action=(action) {
            label for="name" { "Name" }
            input #name type="text" name="name" value=(form.name) required;
            label for="slug" { "Slug" }
            input #slug type="text" name="slug" value=(form.slug) placeholder="derived from the name";
            label for="description" { "Description" }
            textarea #description name="description" rows="3" { (form.description) }
            label for="website" { "Website" }
            input #website type="url" name="website" value=(form.website) required;
            label for="repository" { "Repository" }
            input #repository type="url" name="repository" value=(form.repository);
            label for="score" { "Score" }
            input #score type="number" name="score" value=(form.score);
            label for="stars" { "Stars" }
            input #stars type="number" name="stars" value=(form.stars);
            label for="published_at" { "Published on" }
            input #published_at type="date" name="published_at" value=(form.published_at);
            label for="last_commit_at" { "Last commit" }
            input #last_commit_at type="date" name="last_commit_at" value=(form.last_commit_at);

            fieldset {
                legend { "Categories" }
                @for c in categories {
                    label.inline {
                        input type="checkbox" name="categories" value=(c.category.id)
                            checked[form.category_ids.contains(&c.category.id)];
                        " " (c.category.name)
                    }
                }
            }
            fieldset {
                legend { "Alternative to" }
                @for a in alternatives {
                    label.inline {
                        input type="checkbox" name="alternatives" value=(a.alternative.id)
                            checked[form.alternative_ids.contains(&a.alternative.id)];
                        " " (a.alternative.name)
                    }
                }
            }
            p { button type="submit" { "Save" } " " a href="/admin/tools" { "Cancel" } }
        }
    }
}

pub fn alternative_form(
    heading: &str,
    action: &str,
    form: &AlternativeForm,
    error: Option<&str>,
) -> Markup {
    html! {
        h1 { (heading) }
        (error_banner(error))
        form.record method="post" action=(action) {
            label for="name" { "Name" }
            input #name type="text" name="name" value=(form.name) required;
            label for="slug" { "Slug" }
            input #slug type="text" name="slug" value=(form.slug) placeholder="derived from the name";
            label for="description" { "Description" }
            textarea #description name="description" rows="3" { (form.description) }
            label for="website" { "Website" }
            input #website type="url" name="website" value=(form.website) required;
            p { button type="submit" { "Save" } " " a href="/admin/alternatives" { "Cancel" } }
        }
    }
}

pub fn category_form(
    heading: &str,
    action: &str,
    form: &CategoryForm,
    error: Option<&str>,
) -> Markup {
    html! {
        h1 { (heading) }
        (error_banner(error))
        form.record method="post" action=(action) {
            label for="name" { "Name" }
            input #name type="text" name="name" value=(form.name) required;
            label for="slug" { "Slug" }
            input #slug type="text" name="slug" value=(form.slug) placeholder="derived from the name";
            label for="label" { "Plural label" }
            input #label type="text" name="label" value=(form.label) placeholder="e.g. Analytics Tools";
            p { button type="submit" { "Save" } " " a href="/admin/categories" { "Cancel" } }
        }
    }
}
