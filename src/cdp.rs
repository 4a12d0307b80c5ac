//! Chrome DevTools Protocol session implementation

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::dom::{DomSnapshot, PxRect, NODE_ATTR};
use crate::session::{CaptureBackground, CaptureRequest, RenderSession, RootMetrics};
use crate::suppress::SuppressionPlan;
use crate::{Error, Result, SessionConfig};

/// Walks the document in pre-order, tags every element with its index and
/// returns the serialized tree. SVG internals are not descended into.
const SNAPSHOT_SCRIPT: &str = r#"(function() {
    const ATTR = '{{NODE_ATTR}}';
    const PROPS = ['display', 'visibility', 'opacity', 'position', 'color', 'backgroundColor',
        'backgroundImage', 'borderTopWidth', 'borderRightWidth', 'borderBottomWidth', 'borderLeftWidth',
        'borderRadius', 'boxShadow', 'backdropFilter', 'fontFamily', 'fontWeight', 'fontStyle', 'fontSize',
        'textDecoration', 'textTransform', 'textAlign', 'lineHeight', 'marginTop', 'marginBottom',
        'paddingLeft', 'transform'];
    const nodes = [];
    function visit(el, parent) {
        const index = nodes.length;
        el.setAttribute(ATTR, String(index));
        const cs = window.getComputedStyle(el);
        const style = {};
        for (const p of PROPS) style[p] = cs[p] || '';
        style.webkitBackdropFilter = cs.getPropertyValue('-webkit-backdrop-filter') || '';
        const r = el.getBoundingClientRect();
        const tag = el.tagName.toUpperCase();
        const cls = typeof el.className === 'string' ? el.className : (el.getAttribute('class') || '');
        const node = {
            index: index,
            parent: parent,
            tag: tag,
            id: el.id || '',
            className: cls,
            src: tag === 'IMG' ? (el.currentSrc || el.src || null) : null,
            rect: { x: r.left, y: r.top, width: r.width, height: r.height },
            style: style,
            children: []
        };
        nodes.push(node);
        if (tag === 'SVG') return;
        for (const child of el.childNodes) {
            if (child.nodeType === Node.TEXT_NODE) {
                node.children.push({ kind: 'text', text: child.textContent });
            } else if (child.nodeType === Node.ELEMENT_NODE) {
                node.children.push({ kind: 'element', index: nodes.length });
                visit(child, index);
            }
        }
    }
    visit(document.documentElement, null);
    return JSON.stringify(nodes);
})()"#;

const MEASURE_SCRIPT: &str = r#"(function() {
    const body = document.body;
    const cs = window.getComputedStyle(body);
    return JSON.stringify({
        width: parseFloat(cs.width),
        height: parseFloat(cs.height),
        scrollWidth: body.scrollWidth,
        scrollHeight: body.scrollHeight
    });
})()"#;

const ASSIGN_IDS_SCRIPT: &str = r#"(function() {
    const ATTR = '{{NODE_ATTR}}';
    const pairs = {{PAIRS}};
    let n = 0;
    for (const [node, id] of pairs) {
        const el = document.querySelector('[' + ATTR + '="' + node + '"]');
        if (el && !el.id) { el.id = id; n++; }
    }
    return JSON.stringify(n);
})()"#;

/// Saved inline styles live on `window` under the plan token until restored.
const APPLY_PLAN_SCRIPT: &str = r#"(function() {
    const ATTR = '{{NODE_ATTR}}';
    const store = window.__h2sPlans = window.__h2sPlans || {};
    const saved = store['{{TOKEN}}'] = [];
    for (const d of {{DIRECTIVES}}) {
        const el = document.querySelector('[' + ATTR + '="' + d.node + '"]');
        if (!el) continue;
        saved.push({ node: d.node, style: el.getAttribute('style') });
        if (d.effect === 'clearText' || d.effect === 'clearTextAndHide') {
            el.style.color = 'transparent';
            el.style.webkitTextFillColor = 'transparent';
        }
        if (d.effect === 'clearTextAndHide') el.style.visibility = 'hidden';
        if (d.effect === 'fadeOut') el.style.opacity = '0';
    }
    return JSON.stringify(saved.length);
})()"#;

const RESTORE_PLAN_SCRIPT: &str = r#"(function() {
    const ATTR = '{{NODE_ATTR}}';
    const store = window.__h2sPlans || {};
    const saved = store['{{TOKEN}}'] || [];
    for (const s of saved.slice().reverse()) {
        const el = document.querySelector('[' + ATTR + '="' + s.node + '"]');
        if (!el) continue;
        if (s.style === null) el.removeAttribute('style'); else el.setAttribute('style', s.style);
    }
    delete store['{{TOKEN}}'];
    return JSON.stringify(saved.length);
})()"#;

const NODE_RECT_SCRIPT: &str = r#"(function() {
    const el = document.querySelector('[{{NODE_ATTR}}="{{NODE}}"]');
    if (!el) return JSON.stringify(null);
    const r = el.getBoundingClientRect();
    return JSON.stringify({ x: r.left, y: r.top, width: r.width, height: r.height });
})()"#;

const FONTS_READY_SCRIPT: &str = r#"document.fonts.ready.then(function() { return JSON.stringify(true); })"#;

/// CDP-backed render session (uses the `headless_chrome` crate)
///
/// Launches a headless Chrome instance and drives a single tab for one
/// conversion. The browser process is torn down when the session is closed
/// or dropped.
pub struct CdpSession {
    browser: Browser,
    tab: Arc<Tab>,
    config: SessionConfig,
}

impl CdpSession {
    /// Launch Chrome and open the tab.
    pub fn launch(config: &SessionConfig) -> Result<Self> {
        let args: Vec<&OsStr> = config.extra_args.iter().map(OsStr::new).collect();
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .path(config.chrome_path.clone())
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        Ok(Self {
            browser,
            tab,
            config: config.clone(),
        })
    }

    fn eval_string(&self, script: &str, await_promise: bool) -> Result<String> {
        let result = self
            .tab
            .evaluate(script, await_promise)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;
        match result.value {
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(other) => Err(Error::ScriptError(format!("Expected a JSON string, got {}", other))),
            None => Err(Error::ScriptError("No value returned from evaluation".into())),
        }
    }

    fn eval_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let text = self.eval_string(script, false)?;
        serde_json::from_str(&text).map_err(|e| Error::ScriptError(format!("Malformed script result: {}", e)))
    }

    /// Wait for web fonts, then give layout the configured settle time.
    fn settle(&self) {
        if let Err(e) = self.eval_string(FONTS_READY_SCRIPT, true) {
            warn!("waiting for fonts failed: {}", e);
        }
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));
    }

    fn set_background(&self, background: CaptureBackground) -> Result<()> {
        match background {
            CaptureBackground::Transparent => {
                self.tab
                    .set_transparent_background_color()
                    .map_err(|e| Error::CaptureError(format!("Failed to set page background: {}", e)))?;
            }
            // raw protocol call, surfaces as a CdpError
            CaptureBackground::Opaque => {
                self.tab
                    .call_method(Emulation::SetDefaultBackgroundColorOverride { color: None })?;
            }
        }
        Ok(())
    }
}

impl RenderSession for CdpSession {
    fn load(&mut self, url: &str) -> Result<()> {
        debug!("loading {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        self.settle();
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| Error::LoadError(format!("Reload failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for reload failed: {}", e)))?;
        self.settle();
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(width as f64),
                height: Some(height as f64),
            })
            .map_err(|e| Error::RenderError(format!("Failed to resize viewport: {}", e)))?;
        std::thread::sleep(Duration::from_millis(self.config.settle_ms.min(200)));
        Ok(())
    }

    fn measure_root(&mut self) -> Result<RootMetrics> {
        self.eval_json(MEASURE_SCRIPT)
    }

    fn snapshot(&mut self) -> Result<DomSnapshot> {
        let script = SNAPSHOT_SCRIPT.replace("{{NODE_ATTR}}", NODE_ATTR);
        let json = self.eval_string(&script, false)?;
        DomSnapshot::from_json(&json)
    }

    fn assign_ids(&mut self, ids: &[(usize, String)]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let pairs = serde_json::to_string(ids).map_err(|e| Error::ScriptError(e.to_string()))?;
        let script = ASSIGN_IDS_SCRIPT
            .replace("{{NODE_ATTR}}", NODE_ATTR)
            .replace("{{PAIRS}}", &pairs);
        let assigned: usize = self.eval_json(&script)?;
        debug!("assigned {} generated ids", assigned);
        Ok(())
    }

    fn apply_plan(&mut self, plan: &SuppressionPlan) -> Result<()> {
        let directives = serde_json::to_string(&plan.directives).map_err(|e| Error::ScriptError(e.to_string()))?;
        let script = APPLY_PLAN_SCRIPT
            .replace("{{NODE_ATTR}}", NODE_ATTR)
            .replace("{{TOKEN}}", &plan.token.to_string())
            .replace("{{DIRECTIVES}}", &directives);
        let touched: usize = self.eval_json(&script)?;
        if touched < plan.directives.len() {
            warn!(
                "plan {} matched {} of {} nodes",
                plan.token,
                touched,
                plan.directives.len()
            );
        }
        Ok(())
    }

    fn restore_plan(&mut self, plan: &SuppressionPlan) -> Result<()> {
        let script = RESTORE_PLAN_SCRIPT
            .replace("{{NODE_ATTR}}", NODE_ATTR)
            .replace("{{TOKEN}}", &plan.token.to_string());
        let _restored: usize = self.eval_json(&script)?;
        Ok(())
    }

    fn node_rect(&mut self, node: usize) -> Result<Option<PxRect>> {
        let script = NODE_RECT_SCRIPT
            .replace("{{NODE_ATTR}}", NODE_ATTR)
            .replace("{{NODE}}", &node.to_string());
        self.eval_json(&script)
    }

    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>> {
        self.set_background(request.background)?;
        let clip = Page::Viewport {
            x: request.clip.x,
            y: request.clip.y,
            width: request.clip.width,
            height: request.clip.height,
            scale: request.scale,
        };
        let shot = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::CaptureError(format!("Screenshot failed: {}", e)));
        // later captures expect the default canvas
        if request.background == CaptureBackground::Transparent {
            self.set_background(CaptureBackground::Opaque)?;
        }
        shot
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process exits promptly
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_have_no_unfilled_tokens() {
        let script = APPLY_PLAN_SCRIPT
            .replace("{{NODE_ATTR}}", NODE_ATTR)
            .replace("{{TOKEN}}", "7")
            .replace("{{DIRECTIVES}}", "[]");
        assert!(!script.contains("{{"));
        assert!(script.contains("data-h2s-node"));
    }

    #[test]
    #[ignore = "Requires Chrome to be installed"]
    fn test_cdp_session_launch() {
        match CdpSession::launch(&SessionConfig::default()) {
            Ok(session) => assert!(session.close().is_ok()),
            Err(e) => eprintln!("Skipping CDP session test because Chrome is not available: {}", e),
        }
    }
}
