use askama::Template;
use axum::{extract::State, response::Html, Form};
use serde::Deserialize;

use crate::error::{render, FrontendError};
use crate::models::AuthUser;
use crate::plagiarism::{PlagiarismForm, MAX_CHARS, MIN_CHARS};
use crate::AppState;

#[derive(Template)]
#[template(path = "fragments/plagiarism.html")]
pub struct PlagiarismFragment {
    pub text: String,
    pub error: Option<String>,
    pub report: Option<String>,
    pub min_chars: usize,
    pub max_chars: usize,
}

impl PlagiarismFragment {
    pub fn from_form(form: &PlagiarismForm) -> Self {
        Self {
            text: form.text.clone(),
            error: form.error.clone(),
            report: form.result.as_ref().map(|report| report.pretty()),
            min_chars: MIN_CHARS,
            max_chars: MAX_CHARS,
        }
    }
}

#[derive(Deserialize)]
pub struct CheckForm {
    #[serde(default)]
    pub text: String,
}

pub async fn check(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<CheckForm>,
) -> Result<Html<String>, FrontendError> {
    let dashboard = state.workspaces.get_or_create(&user.user_id);

    let ticket = {
        let mut dashboard = dashboard.lock().await;
        match dashboard.plagiarism.begin_check(&form.text) {
            Ok(ticket) => ticket,
            Err(_) => return render(&PlagiarismFragment::from_form(&dashboard.plagiarism)),
        }
    };

    let outcome = state.plagiarism.check_plagiarism(&ticket.text).await;

    let mut dashboard = dashboard.lock().await;
    dashboard.plagiarism.finish_check(ticket.seq, outcome);
    render(&PlagiarismFragment::from_form(&dashboard.plagiarism))
}
