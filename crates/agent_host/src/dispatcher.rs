use services::{FactStore, ThemeStore};
use shared::directive::{Directive, Panel, Widget};
use shared::palette::PaletteEntry;

/// The surface that shows panels and widgets. Calls are fire-and-forget.
pub trait UiHost: Send {
    /// Only one panel is active; opening another replaces it.
    fn open_panel(&mut self, panel: Panel);
    fn toggle_widget(&mut self, widget: Widget);
}

/// What a batch of directives did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub panels: Vec<Panel>,
    pub widgets: Vec<Widget>,
    pub accent: Option<PaletteEntry>,
    pub facts_added: usize,
}

/// Routes directives to the host, the theme and the fact store.
pub struct ActionDispatcher<H: UiHost> {
    host: H,
    theme: ThemeStore,
    facts: FactStore,
}

impl<H: UiHost> ActionDispatcher<H> {
    pub fn new(host: H, theme: ThemeStore, facts: FactStore) -> Self {
        Self { host, theme, facts }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// Apply directives in order. Facts are merged as one batch at the end.
    /// Store failures are logged and skipped.
    pub fn dispatch(&mut self, directives: Vec<Directive>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut new_facts = Vec::new();

        for directive in directives {
            tracing::debug!("Dispatching {:?}", directive);
            match directive {
                Directive::OpenPanel(panel) => {
                    self.host.open_panel(panel);
                    report.panels.push(panel);
                }
                Directive::ToggleWidget(widget) => {
                    self.host.toggle_widget(widget);
                    report.widgets.push(widget);
                }
                Directive::SetAccentColor(entry) => match self.theme.set_accent(entry) {
                    Ok(()) => report.accent = Some(entry),
                    Err(e) => tracing::warn!("Failed to apply accent {}: {:#}", entry.name, e),
                },
                Directive::SaveFact(fact) => new_facts.push(fact),
            }
        }

        if !new_facts.is_empty() {
            match self.facts.remember(&new_facts) {
                Ok(added) => report.facts_added = added,
                Err(e) => tracing::warn!("Failed to save {} fact(s): {:#}", new_facts.len(), e),
            }
        }
        report
    }
}
