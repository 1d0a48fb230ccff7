use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use tower_sessions::Session;

use crate::error::{render, FrontendError};
use crate::flash::{self, FlashMessage};
use crate::handlers::chat::ChatFragment;
use crate::handlers::plagiarism::PlagiarismFragment;
use crate::models::{AuthUser, UserProfile};
use crate::navigation::ActiveView;
use crate::workspace::DashboardState;
use crate::AppState;

pub struct NavItem {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "fragments/panel.html")]
pub struct PanelFragment {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Template)]
#[template(path = "fragments/flash.html")]
pub struct FlashFragment {
    pub message: String,
    pub css_class: &'static str,
}

/// Sidebar plus the active view; the swap target for every navigation action.
#[derive(Template)]
#[template(path = "fragments/shell.html")]
pub struct ShellFragment {
    pub user: UserProfile,
    pub collapsed: bool,
    pub is_mobile: bool,
    pub sidebar_width: u32,
    pub nav_items: Vec<NavItem>,
    pub flash_html: String,
    pub content_html: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell_html: String,
}

fn content_html(dashboard: &DashboardState) -> Result<String, FrontendError> {
    let html = match dashboard.navigation.active_view() {
        ActiveView::Home => PanelFragment {
            title: "Home",
            body: "Pick a tool from the sidebar to get started.",
        }
        .render()?,
        ActiveView::CitationGenerator => PanelFragment {
            title: "Citation Generator",
            body: "Generate references for your bibliography.",
        }
        .render()?,
        ActiveView::Repository => PanelFragment {
            title: "Repository",
            body: "Browse the research repository.",
        }
        .render()?,
        ActiveView::PlagiarismChecker => {
            PlagiarismFragment::from_form(&dashboard.plagiarism).render()?
        }
        ActiveView::ChatBot => ChatFragment::from_state(&dashboard.chat).render()?,
    };
    Ok(html)
}

pub fn render_shell(
    user: &AuthUser,
    dashboard: &DashboardState,
    flash: Option<FlashMessage>,
) -> Result<String, FrontendError> {
    let navigation = &dashboard.navigation;

    let flash_html = match flash {
        Some(flash) => FlashFragment {
            message: flash.message,
            css_class: flash.kind.css_class(),
        }
        .render()?,
        None => String::new(),
    };

    let shell = ShellFragment {
        user: user.profile(),
        collapsed: navigation.is_collapsed(),
        is_mobile: navigation.is_mobile(),
        sidebar_width: navigation.collapsed_width(),
        nav_items: ActiveView::ALL
            .iter()
            .map(|view| NavItem {
                slug: view.slug(),
                label: view.label(),
                active: navigation.is_active(*view),
            })
            .collect(),
        flash_html,
        content_html: content_html(dashboard)?,
    };
    Ok(shell.render()?)
}

async fn shell_response(
    state: &AppState,
    session: &Session,
    user: &AuthUser,
    update: impl FnOnce(&mut DashboardState),
) -> Result<Html<String>, FrontendError> {
    let dashboard = state.workspaces.get_or_create(&user.user_id);
    let mut dashboard = dashboard.lock().await;
    update(&mut dashboard);
    let flash = flash::current(session).await;
    Ok(Html(render_shell(user, &dashboard, flash)?))
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Html<String>, FrontendError> {
    let Html(shell_html) = shell_response(&state, &session, &user, |_| {}).await?;
    render(&DashboardTemplate { shell_html })
}

pub async fn select_view(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(view): Path<String>,
) -> Result<Html<String>, FrontendError> {
    let view: ActiveView = view
        .parse()
        .map_err(|e| FrontendError::App(AppError::NotFound(anyhow::Error::new(e))))?;

    shell_response(&state, &session, &user, |dashboard| match view {
        ActiveView::Home => dashboard.navigation.show_home(),
        ActiveView::CitationGenerator => dashboard.navigation.show_citation_generator(),
        ActiveView::Repository => dashboard.navigation.show_repository(),
        ActiveView::PlagiarismChecker => dashboard.navigation.show_plagiarism_checker(),
        ActiveView::ChatBot => dashboard.navigation.show_chat_bot(),
    })
    .await
}

#[derive(Deserialize)]
pub struct CollapseForm {
    /// Explicit state; the sidebar toggles when omitted.
    pub collapsed: Option<bool>,
}

pub async fn collapse(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(form): Form<CollapseForm>,
) -> Result<Html<String>, FrontendError> {
    shell_response(&state, &session, &user, |dashboard| match form.collapsed {
        Some(collapsed) => dashboard.navigation.set_collapsed(collapsed),
        None => dashboard.navigation.toggle_collapsed(),
    })
    .await
}

#[derive(Deserialize)]
pub struct ViewportForm {
    pub width: u32,
}

pub async fn viewport(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(form): Form<ViewportForm>,
) -> Result<Html<String>, FrontendError> {
    shell_response(&state, &session, &user, |dashboard| {
        dashboard.navigation.on_resize(form.width)
    })
    .await
}

pub async fn dismiss_flash(session: Session) -> impl IntoResponse {
    flash::dismiss(&session).await;
    (StatusCode::OK, Html(String::new()))
}
