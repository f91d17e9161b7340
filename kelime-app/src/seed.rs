use chrono::{DateTime, Utc};
use kelime_core::VocabularyCard;

/// (turkish, english, pronunciation, category)
const STARTER: &[(&str, &str, &str, &str)] = &[
    ("merhaba", "hello", "mer-HA-ba", "greetings"),
    ("günaydın", "good morning", "gün-ay-DIN", "greetings"),
    ("teşekkür ederim", "thank you", "te-shek-KÜR e-de-RIM", "politeness"),
    ("nasılsınız", "how are you (formal)", "na-SIL-sı-nız", "questions"),
    ("görüşürüz", "see you later", "gö-rü-SHÜ-rüz", "farewells"),
    ("güneş", "sun", "gü-NEŞH", "nature"),
    ("ay", "moon", "AH-y", "nature"),
    ("deniz", "sea", "de-NİZ", "nature"),
    ("kedi", "cat", "ke-Dİ", "animals"),
    ("köpek", "dog", "kö-PEK", "animals"),
    ("kuş", "bird", "KUŞH", "animals"),
    ("ekmek", "bread", "ek-MEK", "food"),
    ("su", "water", "SU", "food"),
    ("çay", "tea", "ÇHAY", "food"),
    ("peynir", "cheese", "pey-NİR", "food"),
    ("kırmızı", "red", "kır-mı-ZI", "colors"),
    ("mavi", "blue", "ma-Vİ", "colors"),
    ("anne", "mother", "an-NE", "family"),
    ("baba", "father", "ba-BA", "family"),
    ("kardeş", "sibling", "kar-DEŞH", "family"),
];

/// Starter cards with stable ids, so seeding twice adds nothing new.
pub fn starter_cards(now: DateTime<Utc>) -> Vec<VocabularyCard> {
    STARTER
        .iter()
        .enumerate()
        .map(|(i, (turkish, english, pronunciation, category))| {
            let mut card = VocabularyCard::with_id(format!("starter-{:02}", i + 1), *turkish, *english, now);
            card.pronunciation = Some(pronunciation.to_string());
            card.category = Some(category.to_string());
            card.tags = vec!["starter".to_string()];
            card
        })
        .collect()
}
