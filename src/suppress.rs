//! Content suppression plans.
//!
//! A plan is an immutable list of "hide this node this way" directives. The
//! session applies it to the live tree and restores the overwritten inline
//! styles afterwards; `scoped` guarantees the restore runs whatever the
//! capture in between does.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde::Serialize;

use crate::detect::{Component, Graphic, TEXT_ONLY_TAGS};
use crate::dom::DomSnapshot;
use crate::session::RenderSession;
use crate::{ExtractionMode, Result};

/// How a node is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HideEffect {
    /// Text color and text fill transparent; box painting stays
    ClearText,
    /// `ClearText` plus `visibility: hidden`
    ClearTextAndHide,
    /// `opacity: 0`
    FadeOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HideDirective {
    pub node: usize,
    pub effect: HideEffect,
}

/// Text tags whose text is cleared inside a skeleton; their own box still paints.
pub const SKELETON_TEXT_TAGS: &[&str] = &[
    "P", "H1", "H2", "H3", "H4", "H5", "H6", "UL", "OL", "LI", "SPAN", "A", "STRONG", "EM", "B", "I", "TD",
    "TH", "BUTTON", "LABEL", "DT", "DD", "BLOCKQUOTE", "FIGCAPTION",
];

/// Tags faded out of the background raster.
pub const BACKGROUND_HIDDEN_TAGS: &[&str] = &[
    "P", "H1", "H2", "H3", "H4", "H5", "H6", "UL", "OL", "LI", "SPAN", "A", "IMG", "SVG", "TD", "TH",
    "BUTTON", "LABEL", "DT", "DD", "BLOCKQUOTE", "FIGCAPTION",
];

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressionPlan {
    /// Key under which the session stashes overwritten styles
    pub token: u64,
    pub directives: Vec<HideDirective>,
}

impl SuppressionPlan {
    pub fn new(directives: Vec<HideDirective>) -> Self {
        Self {
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            directives,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn effect_for(&self, node: usize) -> Option<HideEffect> {
        self.directives.iter().find(|d| d.node == node).map(|d| d.effect)
    }

    /// Hide everything inside a component while keeping its own box.
    ///
    /// Graphics inside it are hidden. Text tags and inner DIVs only lose
    /// their text, so badges, buttons and nested boxes still paint.
    pub fn skeleton(snapshot: &DomSnapshot, component: &Component) -> Self {
        let mut directives = vec![HideDirective {
            node: component.node,
            effect: HideEffect::ClearText,
        }];
        for i in snapshot.descendants(component.node) {
            let node = snapshot.node(i);
            let effect = if node.is_graphic() {
                Some(HideEffect::ClearTextAndHide)
            } else if node.is("DIV") || SKELETON_TEXT_TAGS.contains(&node.tag.as_str()) {
                Some(HideEffect::ClearText)
            } else {
                None
            };
            if let Some(effect) = effect {
                directives.push(HideDirective { node: i, effect });
            }
        }
        Self::new(directives)
    }

    /// Fade out everything that is delivered as another layer.
    pub fn background(
        snapshot: &DomSnapshot,
        components: &[Component],
        graphics: &[Graphic],
        mode: ExtractionMode,
    ) -> Self {
        let mut effects: Vec<Option<HideEffect>> = vec![None; snapshot.len()];
        for node in snapshot.nodes() {
            let tag = node.tag.as_str();
            effects[node.index] = match mode {
                ExtractionMode::Layered if BACKGROUND_HIDDEN_TAGS.contains(&tag) => Some(HideEffect::FadeOut),
                // wrappers keep painting, only their own text goes
                ExtractionMode::Layered if node.has_direct_text() => Some(HideEffect::ClearText),
                ExtractionMode::Layered => None,
                // flat slides keep every box in the background, only text and images leave
                ExtractionMode::Flat if tag == "IMG" => Some(HideEffect::FadeOut),
                ExtractionMode::Flat if TEXT_ONLY_TAGS.contains(&tag) || node.has_direct_text() => {
                    Some(HideEffect::ClearText)
                }
                ExtractionMode::Flat => None,
            };
        }
        for node in components.iter().map(|c| c.node).chain(graphics.iter().map(|g| g.node)) {
            effects[node] = Some(HideEffect::FadeOut);
        }
        let directives = effects
            .into_iter()
            .enumerate()
            .filter_map(|(node, effect)| effect.map(|effect| HideDirective { node, effect }))
            .collect();
        Self::new(directives)
    }
}

/// Apply `plan`, run `f`, then restore, even when `f` fails.
///
/// An error from `f` wins over a restore error; the restore error is still
/// logged.
pub fn scoped<S, T, F>(session: &mut S, plan: &SuppressionPlan, f: F) -> Result<T>
where
    S: RenderSession,
    F: FnOnce(&mut S) -> Result<T>,
{
    if plan.is_empty() {
        return f(session);
    }
    debug!("applying suppression plan {} ({} nodes)", plan.token, plan.directives.len());
    if let Err(e) = session.apply_plan(plan) {
        // a partial apply still has to be undone
        if let Err(restore_err) = session.restore_plan(plan) {
            warn!("restoring partially applied plan {} failed: {}", plan.token, restore_err);
        }
        return Err(e);
    }
    let outcome = f(session);
    let restored = session.restore_plan(plan);
    match (outcome, restored) {
        (Ok(v), Ok(())) => Ok(v),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore_err)) => {
            warn!("restoring plan {} after a failed capture also failed: {}", plan.token, restore_err);
            Err(e)
        }
    }
}
