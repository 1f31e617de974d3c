use crate::config::RideContent;
use crate::dialogue::{CharacterDialogue, DialogueActionType, DialogueAnswer, DialogueNode, RoundSequence};
use crate::results::{ResultsContent, WordEntry, WordKind};

fn node(id: &str, target: Option<&str>, text: &str) -> DialogueNode {
    DialogueNode {
        id: id.into(),
        target_id: target.map(Into::into),
        text: text.into(),
        ..Default::default()
    }
}

fn answer(id: &str, target: Option<&str>, text: &str) -> DialogueAnswer {
    DialogueAnswer {
        id: id.into(),
        target_id: target.map(Into::into),
        text: text.into(),
        should_pause: true,
    }
}

fn word(id: &str, title: &str, kind: WordKind) -> WordEntry {
    WordEntry {
        id: id.into(),
        title: title.into(),
        kind,
    }
}

// ---------------------------------------------------------------------------
// Night shift scenario
// ---------------------------------------------------------------------------

pub fn night_shift_scenario() -> RideContent {
    let mara = CharacterDialogue {
        character_id: "mara".into(),
        character_name: "Mara".into(),
        nodes: vec![
            node(
                "start",
                Some("ask"),
                "Evening. Take me to the <link=clinic>clinic</link> on Fifth, please.",
            ),
            DialogueNode {
                answers: vec![
                    answer("shift", Some("shift"), "Starting or ending a shift?"),
                    answer("quiet", Some("quiet"), "(Say nothing.)"),
                ],
                ..node("ask", None, "")
            },
            DialogueNode {
                action_type: DialogueActionType::Smile,
                should_pause: true,
                ..node(
                    "shift",
                    Some("bye"),
                    "Starting. Twelve hours of bandages and <link=coffee>bad coffee</link>.",
                )
            },
            DialogueNode {
                action_type: DialogueActionType::TakePhone,
                ..node("quiet", Some("bye"), "...")
            },
            node("bye", None, "This is it. Keep the change."),
        ],
    };

    let tomas = CharacterDialogue {
        character_id: "tomas".into(),
        character_name: "Tomas".into(),
        nodes: vec![
            DialogueNode {
                answers: vec![
                    answer("smell", Some("kitchen"), "Long day?"),
                    answer("where", Some("market"), "Where to?"),
                ],
                ..node(
                    "start",
                    None,
                    "Sorry about the smell. Onions, all day, in a hot <link=kitchen>kitchen</link>.",
                )
            },
            DialogueNode {
                action_type: DialogueActionType::LookAway,
                ..node(
                    "kitchen",
                    Some("market"),
                    "Sixty covers tonight. My <link=knife>knife</link> hand is shaking.",
                )
            },
            node(
                "market",
                None,
                "Drop me at the night <link=market>market</link>. I still need fish for tomorrow.",
            ),
        ],
    };

    RideContent {
        sequence: RoundSequence {
            dialogues: vec![mara, tomas],
        },
        results: ResultsContent {
            words: vec![
                word("mara", "Mara", WordKind::Name),
                word("tomas", "Tomas", WordKind::Name),
                word("nurse", "Nurse", WordKind::Profession),
                word("chef", "Chef", WordKind::Profession),
                word("pilot", "Pilot", WordKind::Profession),
                word("shop", "Shops", WordKind::Action),
            ],
            profession_answers: vec!["nurse".into(), "chef".into()],
            text_answers: vec!["clinic".into(), "market".into()],
        },
    }
}
