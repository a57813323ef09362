//! Landscape and splash collage shown outside of combat.

use tracing::debug;

use crate::scene::Splash;
use crate::sync::SceneSignal;

/// What the campaign display shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignView {
    landscape: Option<String>,
    splashes: Vec<Splash>,
}

impl CampaignView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a landscape or splash signal. Returns whether it was one.
    pub fn apply(&mut self, signal: &SceneSignal) -> bool {
        match signal {
            SceneSignal::LandscapeSelected(image) => {
                self.landscape = Some(image.clone());
            },
            SceneSignal::LandscapeUnselected => self.landscape = None,
            SceneSignal::SplashSelected(splash) => {
                if self.splashes.iter().any(|s| s.image == splash.image) {
                    debug!(image = %splash.image, "splash already shown");
                } else {
                    self.splashes.push(splash.clone());
                }
            },
            SceneSignal::SplashUnselected(splash) => {
                self.splashes.retain(|s| s.image != splash.image);
            },
            SceneSignal::ClearAllSplashes => self.splashes.clear(),
            _ => return false,
        }
        true
    }

    /// Selected landscape image.
    #[must_use]
    pub fn landscape(&self) -> Option<&str> {
        self.landscape.as_deref()
    }

    /// Splashes in selection order.
    #[must_use]
    pub fn splashes(&self) -> &[Splash] {
        &self.splashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Allegiance;

    fn splash(image: &str) -> Splash {
        Splash {
            allegiance: Allegiance::Neutral,
            image: image.to_string(),
        }
    }

    #[test]
    fn test_collage() {
        let mut view = CampaignView::new();
        assert!(view.apply(&SceneSignal::LandscapeSelected("vale.png".into())));
        view.apply(&SceneSignal::SplashSelected(splash("bard.png")));
        view.apply(&SceneSignal::SplashSelected(splash("king.png")));
        view.apply(&SceneSignal::SplashSelected(splash("bard.png")));
        assert_eq!(view.landscape(), Some("vale.png"));
        assert_eq!(view.splashes().len(), 2);

        // Unselect matches on image only.
        let mut hostile = splash("bard.png");
        hostile.allegiance = Allegiance::Hostile;
        view.apply(&SceneSignal::SplashUnselected(hostile));
        assert_eq!(view.splashes(), &[splash("king.png")]);

        view.apply(&SceneSignal::ClearAllSplashes);
        view.apply(&SceneSignal::LandscapeUnselected);
        assert_eq!(view, CampaignView::new());
    }

    #[test]
    fn test_combat_signals_are_not_campaign() {
        let mut view = CampaignView::new();
        assert!(!view.apply(&SceneSignal::ToggleGrid));
        assert!(!view.apply(&SceneSignal::CombatSelected));
    }
}
