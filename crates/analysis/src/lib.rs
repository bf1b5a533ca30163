use std::time::Duration;

use common::Tag;

pub const GENRES: [&str; 12] = [
    "Pop",
    "Rock",
    "Hip Hop",
    "R&B",
    "Jazz",
    "Classical",
    "Electronic",
    "Dance",
    "Indie",
    "Country",
    "Metal",
    "Folk",
];

const PRIMARY_CONFIDENCE: f64 = 0.95;

/// Derives an ordered tag list from a song title alone. There is no audio
/// analysis behind this: the title's UTF-16 code units are summed and the
/// sum selects genres from the fixed vocabulary. Same title, same output.
pub fn classify_title(title: &str) -> Vec<Tag> {
    let title_sum: u64 = title.encode_utf16().map(u64::from).sum();
    let primary_index = (title_sum % GENRES.len() as u64) as usize;
    let primary = GENRES[primary_index];

    let mut tags = vec![Tag {
        name: primary.to_string(),
        confidence: PRIMARY_CONFIDENCE,
    }];

    let extra_count = (title_sum % 3) as usize + 1;
    for position in 0..extra_count {
        let index = (primary_index + position + 1) % GENRES.len();
        let candidate = GENRES[index];
        if candidate == primary {
            continue;
        }
        // Confidence goes negative from the sixth extra tag onward; the
        // vocabulary caps extras at three so the quirk stays latent.
        let confidence = round2(0.85 - position as f64 * 0.20);
        tags.push(Tag {
            name: candidate.to_string(),
            confidence,
        });
    }

    tags
}

/// Hand-authored table of reference titles per vocabulary genre. Unknown
/// genre names yield an empty list.
pub fn similar_titles(genre: &str, limit: usize) -> Vec<String> {
    let titles: &[&str] = match genre {
        "Pop" => &[
            "Shape of You",
            "Bad Guy",
            "Blinding Lights",
            "Watermelon Sugar",
            "Don't Start Now",
        ],
        "Rock" => &[
            "Bohemian Rhapsody",
            "Sweet Child O' Mine",
            "Back in Black",
            "Stairway to Heaven",
            "Smells Like Teen Spirit",
        ],
        "Hip Hop" => &[
            "Sicko Mode",
            "God's Plan",
            "HUMBLE.",
            "99 Problems",
            "Lose Yourself",
        ],
        "R&B" => &["Blinding Lights", "Adorn", "Redbone", "Love Galore", "Crew"],
        "Jazz" => &[
            "Take Five",
            "So What",
            "My Favorite Things",
            "A Love Supreme",
            "Sing, Sing, Sing",
        ],
        "Classical" => &[
            "Canon in D",
            "Für Elise",
            "Moonlight Sonata",
            "The Four Seasons",
            "Symphony No. 5",
        ],
        "Electronic" => &[
            "Around the World",
            "Strobe",
            "Scary Monsters and Nice Sprites",
            "Levels",
            "Animals",
        ],
        "Dance" => &[
            "One More Time",
            "Don't You Worry Child",
            "Clarity",
            "Summer",
            "Wake Me Up",
        ],
        "Indie" => &[
            "Do I Wanna Know?",
            "Mr. Brightside",
            "Midnight City",
            "Skinny Love",
            "Chamber of Reflection",
        ],
        "Country" => &[
            "Old Town Road",
            "Meant to Be",
            "Body Like a Back Road",
            "Cruise",
            "Tequila",
        ],
        "Metal" => &[
            "Enter Sandman",
            "Master of Puppets",
            "Paranoid",
            "Chop Suey!",
            "Iron Man",
        ],
        "Folk" => &[
            "The Hanging Tree",
            "Little Lion Man",
            "Ho Hey",
            "Skinny Love",
            "I Will Wait",
        ],
        _ => &[],
    };
    titles
        .iter()
        .take(limit)
        .map(|title| title.to_string())
        .collect()
}

/// Classifier front-end that emulates the latency of a remote analysis
/// call. The delays exist for UI spinners only; zero them in tests.
#[derive(Clone)]
pub struct Analyzer {
    classify_delay: Duration,
    lookup_delay: Duration,
}

impl Analyzer {
    pub fn new(classify_delay: Duration, lookup_delay: Duration) -> Self {
        Self {
            classify_delay,
            lookup_delay,
        }
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub async fn classify(&self, title: &str) -> Vec<Tag> {
        if !self.classify_delay.is_zero() {
            tokio::time::sleep(self.classify_delay).await;
        }
        classify_title(title)
    }

    pub async fn similar(&self, genre: &str, limit: usize) -> Vec<String> {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        similar_titles(genre, limit)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
