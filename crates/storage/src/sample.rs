//! Built-in question pool used to seed a fresh database.

use exam_core::model::{Difficulty, OptionLabel, Question, QuestionDraft, QuestionId};

type Row = (
    u64,
    &'static str,
    [&'static str; 4],
    &'static str,
    Difficulty,
    OptionLabel,
    &'static str,
);

const SAMPLE: &[Row] = &[
    (
        1,
        "Auf welcher OSI-Schicht arbeitet TCP?",
        ["Vermittlungsschicht", "Transportschicht", "Sitzungsschicht", "Anwendungsschicht"],
        "Netzwerk",
        Difficulty::Easy,
        OptionLabel::B,
        "TCP ist ein Protokoll der Transportschicht (Schicht 4).",
    ),
    (
        2,
        "Wie viele nutzbare Hostadressen hat ein /26-Netz?",
        ["30", "62", "64", "126"],
        "Netzwerk",
        Difficulty::Medium,
        OptionLabel::B,
        "2^6 - 2 = 62 (Netz- und Broadcastadresse abgezogen).",
    ),
    (
        3,
        "Welcher Port ist standardmäßig für HTTPS reserviert?",
        ["21", "80", "443", "8080"],
        "Netzwerk",
        Difficulty::Easy,
        OptionLabel::C,
        "",
    ),
    (
        4,
        "Welches Protokoll löst IPv4-Adressen in MAC-Adressen auf?",
        ["DNS", "DHCP", "ARP", "ICMP"],
        "Netzwerk",
        Difficulty::Medium,
        OptionLabel::C,
        "",
    ),
    (
        5,
        "Welche SQL-Anweisung entfernt eine Tabelle vollständig?",
        ["DELETE", "DROP TABLE", "TRUNCATE", "REMOVE"],
        "Datenbanken",
        Difficulty::Easy,
        OptionLabel::B,
        "",
    ),
    (
        6,
        "Was beschreibt die zweite Normalform?",
        [
            "Atomare Attributwerte",
            "Keine transitiven Abhängigkeiten",
            "Volle funktionale Abhängigkeit vom Schlüssel",
            "Keine Mehrwertigen Abhängigkeiten",
        ],
        "Datenbanken",
        Difficulty::Hard,
        OptionLabel::C,
        "2NF verlangt, dass jedes Nichtschlüsselattribut voll vom Primärschlüssel abhängt.",
    ),
    (
        7,
        "Welcher JOIN liefert nur Zeilen mit Treffern in beiden Tabellen?",
        ["LEFT JOIN", "RIGHT JOIN", "FULL OUTER JOIN", "INNER JOIN"],
        "Datenbanken",
        Difficulty::Easy,
        OptionLabel::D,
        "",
    ),
    (
        8,
        "Wofür steht das A in ACID?",
        ["Atomicity", "Availability", "Accuracy", "Authorization"],
        "Datenbanken",
        Difficulty::Medium,
        OptionLabel::A,
        "",
    ),
    (
        9,
        "Welche Laufzeit hat die binäre Suche im schlechtesten Fall?",
        ["O(1)", "O(log n)", "O(n)", "O(n log n)"],
        "Programmierung",
        Difficulty::Medium,
        OptionLabel::B,
        "",
    ),
    (
        10,
        "Welches Schlüsselwort verhindert in Java das Überschreiben einer Methode?",
        ["static", "private", "final", "abstract"],
        "Programmierung",
        Difficulty::Easy,
        OptionLabel::C,
        "",
    ),
    (
        11,
        "Welche Datenstruktur arbeitet nach dem LIFO-Prinzip?",
        ["Queue", "Stack", "Liste", "Baum"],
        "Programmierung",
        Difficulty::Easy,
        OptionLabel::B,
        "",
    ),
    (
        12,
        "Wie viele Bit umfasst eine IPv6-Adresse?",
        ["32", "64", "128", "256"],
        "Netzwerk",
        Difficulty::Easy,
        OptionLabel::C,
        "",
    ),
];

/// The sample pool as validated questions.
#[must_use]
pub fn sample_questions() -> Vec<Question> {
    SAMPLE
        .iter()
        .filter_map(|(id, prompt, options, category, difficulty, correct, explanation)| {
            QuestionDraft {
                id: QuestionId::new(*id),
                prompt: (*prompt).to_owned(),
                options: options.map(str::to_owned),
                category: (*category).to_owned(),
                difficulty: *difficulty,
                correct: *correct,
                explanation: Some((*explanation).to_owned()),
            }
            .validate()
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_pool_is_valid() {
        assert_eq!(sample_questions().len(), SAMPLE.len());
    }
}
