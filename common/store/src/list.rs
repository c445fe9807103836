//! Dialogues that ship with the crate.

use common_story::DialogueGraph;

use crate::{AssetFormat, StoreError};

#[derive(
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[allow(missing_docs)]
pub enum BundledDialog {
    Crossroads,
    NightWatch,
}

impl BundledDialog {
    /// Parse the bundled asset into a validated dialogue graph.
    pub fn parse(self) -> Result<DialogueGraph, StoreError> {
        let graph = AssetFormat::Json.decode(self.contents())?;
        graph.validate()?;

        Ok(graph)
    }

    /// Path of the asset relative to the crate root.
    pub fn path(self) -> &'static str {
        use BundledDialog::*;

        match self {
            Crossroads => "assets/crossroads.json",
            NightWatch => "assets/night_watch.json",
        }
    }

    fn contents(self) -> &'static str {
        use BundledDialog::*;

        match self {
            Crossroads => include_str!("../assets/crossroads.json"),
            NightWatch => include_str!("../assets/night_watch.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use common_story::Player;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn it_validates_dialogs() {
        for dialog in BundledDialog::iter() {
            println!("Validating {dialog:?}");
            dialog.parse().unwrap();
        }
    }

    #[test]
    fn it_plays_every_dialog_to_an_end() {
        for dialog in BundledDialog::iter() {
            let mut player = Player::new(dialog.parse().unwrap()).unwrap();

            // always taking the last choice reaches an ending in both
            for _ in 0..32 {
                assert!(!player.current_text().unwrap().is_empty());
                if player.is_at_end() {
                    break;
                }
                let last = player.current_choices().len() - 1;
                player.choose(last).unwrap();
            }

            assert!(player.is_at_end(), "{dialog} has no reachable ending");
        }
    }

    #[test]
    fn it_parses_names() {
        assert_eq!(
            Ok(BundledDialog::NightWatch),
            "night_watch".parse::<BundledDialog>()
        );
        assert_eq!("crossroads", BundledDialog::Crossroads.to_string());
    }
}
