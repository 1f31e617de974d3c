pub mod clues;
pub mod content;
pub mod markup;
pub mod presenter;
pub mod runner;

pub use clues::ClueCollector;
pub use content::{CharacterDialogue, DialogueActionType, DialogueAnswer, DialogueNode, RoundSequence};
pub use presenter::{DialoguePresentation, DialoguePresenter, DialogueView, PresenterConfig};
