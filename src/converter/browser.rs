/// Converter backend that drives the ICSharpCode CodeConverter web page.
///
/// Every selector and polling threshold comes from [`ConverterConfig`]; the
/// page is external and changes on its own schedule. One browser is launched
/// per conversion and closed on every exit path.
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::{
    ConverterBackend, ConverterError, InputMethod, InputRetry, InputVerdict, PollState,
    StabilityTracker, check_output, looks_like_csharp_output,
};
use crate::browser::{self, BrowserOptions, BrowserSession, close_page};
use crate::config::ConverterConfig;

const ELEMENT_POLL: Duration = Duration::from_millis(250);
const INPUT_SETTLE: Duration = Duration::from_millis(1000);
const FOCUS_PAUSE: Duration = Duration::from_millis(500);

/// CDP modifier bit for Ctrl.
const CTRL_MODIFIER: i64 = 2;

// ── Page scripts ─────────────────────────────────────────────────────
//
// Scripts return "" or false instead of null so results always deserialize.

const SET_INPUT_SCRIPT: &str = r#"((code) => {
    if (window.monaco && window.monaco.editor && window.monaco.editor.getModels().length > 0) {
        window.monaco.editor.getModels()[0].setValue(code);
        return true;
    }
    return false;
})"#;

const CLEAR_INPUT_SCRIPT: &str = r#"(() => {
    if (window.monaco && window.monaco.editor && window.monaco.editor.getModels().length > 0) {
        window.monaco.editor.getModels()[0].setValue('');
    }
    return true;
})()"#;

const READ_INPUT_SCRIPT: &str = r#"((container) => {
    if (window.monaco && window.monaco.editor && window.monaco.editor.getModels().length > 0) {
        return window.monaco.editor.getModels()[0].getValue();
    }
    const own = document.querySelector(container + ' textarea');
    if (own && own.value) {
        return own.value;
    }
    const any = document.querySelector('textarea.inputarea');
    return any ? any.value : '';
})"#;

const CLICK_CONVERT_SCRIPT: &str = r#"((selectors, texts) => {
    for (const sel of selectors) {
        const button = document.querySelector(sel);
        if (button) {
            button.click();
            return sel;
        }
    }
    for (const button of document.querySelectorAll('button')) {
        const label = button.textContent.trim().toLowerCase();
        if (texts.some((t) => label === t || label.includes(t))) {
            button.click();
            return 'text:' + label;
        }
    }
    return '';
})"#;

const READ_OUTPUT_SCRIPT: &str = r#"((container) => {
    if (window.monaco && window.monaco.editor && window.monaco.editor.getModels().length > 1) {
        return window.monaco.editor.getModels()[1].getValue();
    }
    const area = document.querySelector(container + ' textarea');
    return area ? area.value : '';
})"#;

const READ_VALUE_SCRIPT: &str = r#"((sel) => {
    const el = document.querySelector(sel);
    if (!el) {
        return '';
    }
    return el.value || el.textContent || '';
})"#;

fn call(function: &str, args: &[&serde_json::Value]) -> String {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("{function}({})", args.join(", "))
}

/// Ctrl+A as a key-down / key-up pair. The key-down also carries the
/// editor `selectAll` command so it works without an OS keymap.
fn select_all_events() -> Result<Vec<DispatchKeyEventParams>, ConverterError> {
    [(DispatchKeyEventType::KeyDown, true), (DispatchKeyEventType::KeyUp, false)]
        .into_iter()
        .map(|(kind, with_command)| {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind)
                .modifiers(CTRL_MODIFIER)
                .key("a")
                .code("KeyA")
                .windows_virtual_key_code(65);
            if with_command {
                builder = builder.command("selectAll");
            }
            builder.build().map_err(browser_err)
        })
        .collect()
}

/// Empty the focused editor: select all and delete through real key
/// events, then the scripting API when the page has one.
async fn clear_editor(page: &Page, textarea: &Element) -> Result<(), ConverterError> {
    for event in select_all_events()? {
        page.execute(event).await.map_err(browser_err)?;
    }
    textarea.press_key("Delete").await.map_err(browser_err)?;
    let _: bool = evaluate(page, CLEAR_INPUT_SCRIPT.to_string()).await?;
    Ok(())
}

fn browser_err(e: impl std::fmt::Display) -> ConverterError {
    ConverterError::Browser(e.to_string())
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: String) -> Result<T, ConverterError> {
    let params = EvaluateParams::builder()
        .expression(script)
        .return_by_value(true)
        .await_promise(true)
        .build()
        .map_err(browser_err)?;
    let result = page.evaluate_expression(params).await.map_err(browser_err)?;
    result.into_value::<T>().map_err(browser_err)
}

async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Option<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Some(element);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(ELEMENT_POLL).await;
    }
}

/// First selector that resolves within `timeout`, in list order.
async fn find_first(
    page: &Page,
    selectors: &[String],
    timeout: Duration,
) -> Option<(String, Element)> {
    for selector in selectors {
        if let Some(element) = wait_for_element(page, selector, timeout).await {
            return Some((selector.clone(), element));
        }
        debug!("Selector {selector} did not resolve");
    }
    None
}

// ── Backend ──────────────────────────────────────────────────────────

pub struct BrowserConverter {
    config: ConverterConfig,
}

impl BrowserConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.config.headless,
            user_agent: Some(self.config.user_agent.clone()),
            extra_args: Vec::new(),
        }
    }

    async fn run(&self, vb_code: &str) -> Result<String, ConverterError> {
        let session = BrowserSession::launch(&self.browser_options())
            .await
            .map_err(|e| ConverterError::Browser(format!("{e:#}")))?;

        let result = self.run_in_session(&session, vb_code).await;
        session.close().await;
        result
    }

    async fn run_in_session(
        &self,
        session: &BrowserSession,
        vb_code: &str,
    ) -> Result<String, ConverterError> {
        info!("Navigating to {}", self.config.url);
        let page = session
            .open(&self.config.url)
            .await
            .map_err(|e| ConverterError::Browser(format!("{e:#}")))?;

        let result = self.convert_on_page(&page, vb_code).await;
        close_page(page).await;
        result
    }

    async fn convert_on_page(&self, page: &Page, vb_code: &str) -> Result<String, ConverterError> {
        sleep(Duration::from_millis(self.config.settle_ms)).await;

        self.enter_input(page, vb_code).await?;
        self.click_convert(page).await?;
        let csharp = self.await_output(page).await?;

        check_output(&csharp, self.config.min_output_chars, self.config.strict_output)?;
        info!("Conversion complete: {} chars", csharp.chars().count());
        Ok(csharp)
    }

    // ── Input ────────────────────────────────────────────────────────

    async fn enter_input(&self, page: &Page, vb_code: &str) -> Result<(), ConverterError> {
        let (selector, textarea) = find_first(
            page,
            &self.config.input_selectors,
            self.config.selector_timeout(),
        )
        .await
        .ok_or_else(|| ConverterError::ElementNotFound("input editor".to_string()))?;
        info!("Found input field with selector: {selector}");

        if let Ok(container) = page
            .find_element(self.config.input_container_selector.as_str())
            .await
        {
            if let Err(e) = container.click().await {
                debug!("Could not focus input editor: {e}");
            }
            sleep(FOCUS_PAUSE).await;
        }

        let expected = vb_code.chars().count();
        let mut retry = InputRetry::new(self.config.input_slack);
        loop {
            let method = retry.method();
            if let Err(e) = self.write_input(page, &textarea, method, vb_code).await {
                warn!("Input via {method:?} failed: {e}");
            }
            sleep(INPUT_SETTLE).await;

            let actual = self.read_input(page).await;
            match retry.verify(expected, actual) {
                InputVerdict::Accepted => {
                    info!("Input verification passed: {actual} of ~{expected} characters");
                    return Ok(());
                }
                InputVerdict::Retry(next) => {
                    warn!(
                        "Input incomplete ({actual} of {expected} chars), retrying via {next:?}"
                    );
                }
                InputVerdict::GiveUp => {
                    return Err(ConverterError::InputIncomplete { actual, expected });
                }
            }
        }
    }

    async fn write_input(
        &self,
        page: &Page,
        textarea: &Element,
        method: InputMethod,
        vb_code: &str,
    ) -> Result<(), ConverterError> {
        match method {
            InputMethod::ScriptApi => {
                let code = serde_json::Value::from(vb_code);
                let applied: bool = evaluate(page, call(SET_INPUT_SCRIPT, &[&code])).await?;
                if !applied {
                    return Err(ConverterError::ElementNotFound("editor scripting API".to_string()));
                }
                Ok(())
            }
            InputMethod::Keystrokes => {
                textarea.focus().await.map_err(browser_err)?;
                clear_editor(page, textarea).await?;
                textarea.type_str(vb_code).await.map_err(browser_err)?;
                Ok(())
            }
        }
    }

    /// Characters currently in the input editor; 0 when unreadable.
    async fn read_input(&self, page: &Page) -> usize {
        let container = serde_json::Value::from(self.config.input_container_selector.as_str());
        match evaluate::<String>(page, call(READ_INPUT_SCRIPT, &[&container])).await {
            Ok(text) => text.chars().count(),
            Err(e) => {
                debug!("Input read-back failed: {e}");
                0
            }
        }
    }

    // ── Convert action ───────────────────────────────────────────────

    async fn click_convert(&self, page: &Page) -> Result<(), ConverterError> {
        let selectors = serde_json::to_value(&self.config.convert_selectors).map_err(browser_err)?;
        let texts = serde_json::to_value(&self.config.convert_button_texts).map_err(browser_err)?;

        let clicked: String =
            evaluate(page, call(CLICK_CONVERT_SCRIPT, &[&selectors, &texts])).await?;
        if !clicked.is_empty() {
            info!("Clicked convert button via {clicked}");
            return Ok(());
        }

        // Script found nothing; fall back to a simulated click.
        let (selector, button) = find_first(
            page,
            &self.config.convert_selectors,
            self.config.selector_timeout(),
        )
        .await
        .ok_or_else(|| ConverterError::ConvertActionFailed("no convert button found".to_string()))?;
        button
            .click()
            .await
            .map_err(|e| ConverterError::ConvertActionFailed(e.to_string()))?;
        info!("Clicked convert button {selector} by mouse");
        Ok(())
    }

    // ── Output ───────────────────────────────────────────────────────

    async fn read_output(&self, page: &Page) -> Result<String, ConverterError> {
        let container = serde_json::Value::from(self.config.output_container_selector.as_str());
        evaluate(page, call(READ_OUTPUT_SCRIPT, &[&container])).await
    }

    async fn await_output(&self, page: &Page) -> Result<String, ConverterError> {
        let mut tracker = StabilityTracker::from_config(&self.config);
        let timeout = self.config.poll_timeout();
        let started = Instant::now();

        while started.elapsed() < timeout {
            match self.read_output(page).await {
                Ok(text) => match tracker.observe(&text) {
                    PollState::Ready => {
                        info!("Output stable after {:?}", started.elapsed());
                        return Ok(text.trim().to_string());
                    }
                    PollState::Pending { stable } => {
                        debug!("Output {} chars, stable for {stable} reads", text.trim().len());
                    }
                    PollState::Empty => debug!("Output still empty"),
                },
                Err(e) => warn!("Error checking output: {e}"),
            }
            sleep(self.config.poll_interval()).await;
        }

        warn!("No stable output after {timeout:?}, trying fallback reads");
        let fallback = match self.fallback_read(page).await {
            Some(text) => Some(text),
            None => tracker.latest().map(String::from),
        };
        match fallback {
            Some(text) if looks_like_csharp_output(&text, self.config.min_output_chars) => {
                Ok(text)
            }
            _ => Err(ConverterError::Timeout(timeout)),
        }
    }

    /// One more pass over every way of reading the output editor.
    async fn fallback_read(&self, page: &Page) -> Option<String> {
        if let Ok(text) = self.read_output(page).await {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }

        for selector in &self.config.output_selectors {
            let sel = serde_json::Value::from(selector.as_str());
            match evaluate::<String>(page, call(READ_VALUE_SCRIPT, &[&sel])).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!("Fallback read succeeded using {selector}");
                    return Some(text.trim().to_string());
                }
                Ok(_) => {}
                Err(e) => debug!("Fallback read via {selector} failed: {e}"),
            }
        }

        if let Ok(element) = page
            .find_element(self.config.output_container_selector.as_str())
            .await
        {
            if let Ok(Some(text)) = element.inner_text().await {
                if !text.trim().is_empty() {
                    return Some(text.trim().to_string());
                }
            }
        }
        None
    }
}

impl ConverterBackend for BrowserConverter {
    fn convert(&self, vb_code: &str) -> Result<String, ConverterError> {
        let rt = browser::runtime().map_err(|e| ConverterError::Browser(format!("{e:#}")))?;
        rt.block_on(self.run(vb_code))
    }

    fn name(&self) -> &str {
        "icsharpcode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_embeds_json_arguments() {
        let code = serde_json::Value::from("Dim s = \"a\"\nEnd Sub");
        let script = call("((c) => c)", &[&code]);
        assert_eq!(script, r#"((c) => c)("Dim s = \"a\"\nEnd Sub")"#);
    }

    #[test]
    fn test_call_with_list_arguments() {
        let sels = serde_json::to_value(["#a", "#b"]).unwrap();
        let texts = serde_json::to_value(["convert"]).unwrap();
        let script = call("f", &[&sels, &texts]);
        assert_eq!(script, r##"f(["#a","#b"], ["convert"])"##);
    }

    #[test]
    fn test_select_all_events() {
        let events = select_all_events().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].r#type, DispatchKeyEventType::KeyDown));
        assert!(matches!(events[1].r#type, DispatchKeyEventType::KeyUp));
        for event in &events {
            assert_eq!(event.modifiers, Some(CTRL_MODIFIER));
            assert_eq!(event.key.as_deref(), Some("a"));
        }
        assert_eq!(events[0].commands, Some(vec!["selectAll".to_string()]));
        assert_eq!(events[1].commands, None);
    }

    #[test]
    fn test_browser_options_follow_config() {
        let config = ConverterConfig {
            headless: false,
            ..ConverterConfig::default()
        };
        let options = BrowserConverter::new(config.clone()).browser_options();
        assert!(!options.headless);
        assert_eq!(options.user_agent.as_deref(), Some(config.user_agent.as_str()));
    }
}
