use rand::Rng;

/// Flips every character to upper or lower case at random.
pub fn shout(text: &str) -> String {
    shout_with(text, &mut rand::thread_rng())
}

pub fn shout_with<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let mut shouted = String::with_capacity(text.len());
    for ch in text.chars() {
        if rng.gen_bool(0.5) {
            shouted.extend(ch.to_uppercase());
        } else {
            shouted.extend(ch.to_lowercase());
        }
    }
    shouted
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{shout, shout_with};

    #[test]
    fn preserves_letters_ignoring_case() {
        let text = "Pika pika, Pikachu! 42";
        let shouted = shout(text);
        assert_eq!(shouted.to_lowercase(), text.to_lowercase());
        let punctuation: String = shouted.chars().filter(|ch| !ch.is_alphabetic()).collect();
        assert_eq!(punctuation, " , ! 42");
    }

    #[test]
    fn same_seed_gives_same_output() {
        let text = "the quick brown fox jumps over the lazy dog";
        let first = shout_with(text, &mut StdRng::seed_from_u64(7));
        let second = shout_with(text, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn long_text_mixes_both_cases() {
        let text = "a".repeat(256);
        let shouted = shout_with(&text, &mut StdRng::seed_from_u64(99));
        assert!(shouted.contains('a'));
        assert!(shouted.contains('A'));
    }

    #[test]
    fn empty_text_stays_empty() {
        assert_eq!(shout(""), "");
    }
}
