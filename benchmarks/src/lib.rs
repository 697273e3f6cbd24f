//! Corpus synthétique pour les benchmarks Criterion.
//!
//! Génère des listings qui ressemblent à TEXTS.FIL : de courts
//! enregistrements binaires suivis de chaînes, regroupés en sections.
//! Déterministe (petit LCG) pour que les mesures soient comparables.

/// Phrases piochées pour les chaînes (tous les glyphes existent en CP 852).
const PHRASES: &[&str] = &[
    "Vítejte v QADAMu!",
    "Stiskni libovolnou klávesu.",
    "Nemáš dost zlata.",
    "Dveře jsou zamčené.",
    "Ahoj, poutníku\\n",
    "Uložit hru?",
];

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }
}

/// Listing de `sections` sections de `lines` lignes chacune.
#[must_use]
pub fn synthetic_source(sections: usize, lines: usize) -> String {
    let mut rng = Lcg(0x51AD_A4);
    let mut out = String::with_capacity(sections * lines * 40);
    for s in 0..sections {
        out.push_str(&format!("SECTION {s}\n"));
        for _ in 0..lines {
            let record = 1 + rng.next() % 6;
            out.push('[');
            for i in 0..record {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(&format!("{:02X}", rng.next() & 0xFF));
            }
            out.push_str("] \"");
            out.push_str(PHRASES[(rng.next() as usize) % PHRASES.len()]);
            out.push('"');
            if rng.next() % 8 == 0 {
                out.push_str(" NO_NUL ; suite sur la ligne suivante");
            }
            out.push('\n');
        }
    }
    out
}
