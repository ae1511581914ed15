use crate::domain::{Difficulty, LetterPair};

/// One entry of the fixed in-memory word bank: a correct word plus three
/// visually-confusable distractors for a letter pair. Doubles as the seed
/// data for `question_bank_templates`.
#[derive(Debug, Clone, Copy)]
pub struct WordBankEntry {
    pub template_id: &'static str,
    pub difficulty: Difficulty,
    pub pair: LetterPair,
    pub target_letter: &'static str,
    pub correct_word: &'static str,
    pub distractors: [&'static str; 3],
    pub hint: &'static str,
}

pub fn question_stem(target_letter: &str) -> String {
    format!("Pilih kata yang benar: mana yang memakai huruf {target_letter}?")
}

/// Entries for a pair, preferring exact difficulty matches but falling back
/// to any difficulty so a pair is never empty-handed.
pub fn candidates(pair: LetterPair, difficulty: Difficulty) -> Vec<&'static WordBankEntry> {
    let exact: Vec<&'static WordBankEntry> = WORD_BANK
        .iter()
        .filter(|e| e.pair == pair && e.difficulty == difficulty)
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    WORD_BANK.iter().filter(|e| e.pair == pair).collect()
}

macro_rules! entry {
    ($id:literal, $diff:ident, $pair:ident, $letter:literal, $word:literal, [$d1:literal, $d2:literal, $d3:literal], $hint:literal) => {
        WordBankEntry {
            template_id: $id,
            difficulty: Difficulty::$diff,
            pair: LetterPair::$pair,
            target_letter: $letter,
            correct_word: $word,
            distractors: [$d1, $d2, $d3],
            hint: $hint,
        }
    };
}

pub const WORD_BANK: &[WordBankEntry] = &[
    // easy
    entry!("e-bd-1", Easy, BD, "B", "BATU", ["DATU", "MATU", "SATU"], "Kata dimulai dengan huruf B, seperti BOLA"),
    entry!("e-bd-2", Easy, BD, "D", "DASI", ["BASI", "PASI", "NASI"], "Kata dimulai dengan huruf D, seperti DADU"),
    entry!("e-bd-3", Easy, BD, "B", "BOLA", ["DOLA", "KOLA", "SOLA"], "Kata dimulai dengan huruf B, benda bundar untuk main"),
    entry!("e-bd-4", Easy, BD, "D", "DADU", ["BADU", "RADU", "KADU"], "Kata dimulai dengan huruf D, mainan kotak untuk dilempar"),
    entry!("e-bd-5", Easy, BD, "B", "BUKU", ["DUKU", "SUKU", "TUKU"], "Kata dimulai dengan huruf B, untuk dibaca"),
    entry!("e-bd-6", Easy, BD, "B", "BABI", ["DABI", "KABI", "RABI"], "Kata dimulai dengan huruf B, hewan berkaki empat"),
    entry!("e-bd-7", Easy, BD, "D", "DADA", ["BADA", "RADA", "KADA"], "Kata dimulai dengan huruf D, bagian tubuh di depan"),
    entry!("e-mw-1", Easy, MW, "M", "MAMA", ["WAMA", "PAPA", "RAMA"], "Kata dimulai dengan huruf M, sebutan untuk ibu"),
    entry!("e-mw-2", Easy, MW, "W", "WAJA", ["MAJA", "RAJA", "TAJA"], "Kata dimulai dengan huruf W, bagian depan mobil"),
    entry!("e-mw-3", Easy, MW, "M", "MEJA", ["WEJA", "REJA", "TEJA"], "Kata dimulai dengan huruf M, tempat makan atau belajar"),
    entry!("e-mw-4", Easy, MW, "W", "WALI", ["MALI", "BALI", "KALI"], "Kata dimulai dengan huruf W, orang yang menjaga"),
    entry!("e-pq-1", Easy, PQ, "P", "PAKU", ["QAKU", "BAKU", "MAKU"], "Kata dimulai dengan huruf P, benda runcing dari besi"),
    entry!("e-pq-2", Easy, PQ, "P", "PAGI", ["QAGI", "BAGI", "LAGI"], "Kata dimulai dengan huruf P, waktu setelah bangun tidur"),
    entry!("e-nu-1", Easy, NU, "N", "NASI", ["UASI", "BASI", "RASI"], "Kata dimulai dengan huruf N, makanan pokok dari beras"),
    entry!("e-nu-2", Easy, NU, "N", "NAGA", ["UAGA", "RAGA", "TAGA"], "Kata dimulai dengan huruf N, hewan mitos yang besar"),
    entry!("e-nu-3", Easy, NU, "U", "ULAR", ["NLAR", "ILAR", "JLAR"], "Kata dimulai dengan huruf U, hewan merayap panjang"),
    entry!("e-mn-1", Easy, MN, "M", "MATA", ["NATA", "RATA", "TATA"], "Kata dimulai dengan huruf M, untuk melihat"),
    entry!("e-mn-2", Easy, MN, "N", "NADA", ["MADA", "PADA", "SADA"], "Kata dimulai dengan huruf N, tinggi rendah suara"),
    // medium
    entry!("m-bd-1", Medium, BD, "B", "BARU", ["DARU", "BIRU", "DURI"], "Kata dengan huruf B, lawan dari lama"),
    entry!("m-bd-2", Medium, BD, "D", "DURI", ["BURI", "BIRU", "KURI"], "Kata dengan huruf D, benda tajam di tumbuhan"),
    entry!("m-bd-3", Medium, BD, "B", "BAYI", ["DAYI", "RABI", "KADI"], "Kata dengan huruf B, anak yang baru lahir"),
    entry!("m-bd-4", Medium, BD, "D", "DARI", ["BARI", "HARI", "LARI"], "Kata dengan huruf D, menunjukkan asal"),
    entry!("m-bd-5", Medium, BD, "B", "BUDI", ["DUDI", "RUDI", "SUDI"], "Kata dengan huruf B, nama orang atau perilaku baik"),
    entry!("m-bd-6", Medium, BD, "D", "DUIT", ["BUIT", "SUIT", "TUIT"], "Kata dengan huruf D, uang untuk belanja"),
    entry!("m-mw-1", Medium, MW, "M", "MATI", ["WATI", "PATI", "SATI"], "Kata dengan huruf M, lawan dari hidup"),
    entry!("m-mw-2", Medium, MW, "W", "WARNA", ["MARNA", "BARNA", "DARNA"], "Kata dengan huruf W, merah, biru, hijau adalah..."),
    entry!("m-mw-3", Medium, MW, "M", "MADU", ["WADU", "RADU", "PADU"], "Kata dengan huruf M, cairan manis dari lebah"),
    entry!("m-mw-4", Medium, MW, "W", "WAKTU", ["MAKTU", "FAKTU", "PAKTU"], "Kata dengan huruf W, jam menunjukkan..."),
    entry!("m-pq-1", Medium, PQ, "P", "PADI", ["QADI", "RADI", "BADI"], "Kata dengan huruf P, tanaman yang jadi nasi"),
    entry!("m-pq-2", Medium, PQ, "P", "PETA", ["QETA", "META", "BETA"], "Kata dengan huruf P, gambar wilayah atau jalan"),
    entry!("m-nu-1", Medium, NU, "N", "NAMA", ["UAMA", "RAMA", "TAMA"], "Kata dengan huruf N, identitas seseorang"),
    entry!("m-nu-2", Medium, NU, "N", "NANTI", ["UANTI", "BANTI", "PANTI"], "Kata dengan huruf N, menunjukkan waktu yang akan datang"),
    entry!("m-nu-3", Medium, NU, "U", "UDARA", ["NDARA", "ADARA", "IDARA"], "Kata dengan huruf U, yang kita hirup untuk bernapas"),
    entry!("m-mn-1", Medium, MN, "M", "MALAM", ["NALAM", "SALAM", "TALAM"], "Kata dengan huruf M, lawan dari siang"),
    entry!("m-mn-2", Medium, MN, "N", "NILAI", ["MILAI", "SILAI", "TILAI"], "Kata dengan huruf N, hasil ulangan di sekolah"),
    // hard
    entry!("h-bd-1", Hard, BD, "B", "BERITA", ["DERITA", "CERITA", "SERITA"], "Kata dengan huruf B, informasi atau kabar"),
    entry!("h-bd-2", Hard, BD, "D", "DERITA", ["BERITA", "CERITA", "SERITA"], "Kata dengan huruf D, penderitaan atau kesusahan"),
    entry!("h-bd-3", Hard, BD, "B", "BAKTI", ["DAKTI", "SAKTI", "FAKTI"], "Kata dengan huruf B, pengabdian atau pelayanan"),
    entry!("h-bd-4", Hard, BD, "D", "DALAM", ["BALAM", "SALAM", "MALAM"], "Kata dengan huruf D, lawan dari dangkal atau luar"),
    entry!("h-bd-5", Hard, BD, "B", "BUDAYA", ["DUDAYA", "SUDAYA", "RUDAYA"], "Kata dengan huruf B, kebiasaan atau tradisi"),
    entry!("h-bd-6", Hard, BD, "D", "DUNIA", ["BUNIA", "SUNIA", "RUNIA"], "Kata dengan huruf D, planet tempat kita tinggal"),
    entry!("h-mw-1", Hard, MW, "M", "MAWAR", ["WAWAR", "SAWAR", "TAWAR"], "Kata dengan huruf M, bunga berduri yang indah"),
    entry!("h-mw-2", Hard, MW, "W", "WAJIB", ["MAJIB", "SAJIB", "TAJIB"], "Kata dengan huruf W, harus dilakukan"),
    entry!("h-mw-3", Hard, MW, "M", "MIMPI", ["WIMPI", "SIMPI", "TIMPI"], "Kata dengan huruf M, angan-angan saat tidur"),
    entry!("h-mw-4", Hard, MW, "W", "WAJAH", ["MAJAH", "RAJAH", "SAJAH"], "Kata dengan huruf W, muka atau rupa"),
    entry!("h-pq-1", Hard, PQ, "P", "PAHAM", ["QAHAM", "SAHAM", "RAHAM"], "Kata dengan huruf P, mengerti atau memahami"),
    entry!("h-pq-2", Hard, PQ, "P", "PIDATO", ["QIDATO", "SIDATO", "RIDATO"], "Kata dengan huruf P, berbicara di depan umum"),
    entry!("h-nu-1", Hard, NU, "N", "NEGARA", ["UEGARA", "SEGARA", "MEGARA"], "Kata dengan huruf N, Indonesia adalah sebuah..."),
    entry!("h-nu-2", Hard, NU, "N", "NAFAS", ["UAFAS", "RAFAS", "KAFAS"], "Kata dengan huruf N, udara yang masuk dan keluar"),
    entry!("h-nu-3", Hard, NU, "U", "UCAPAN", ["NCAPAN", "ACAPAN", "ICAPAN"], "Kata dengan huruf U, kata-kata yang disampaikan"),
    entry!("h-mn-1", Hard, MN, "M", "MAKNA", ["NAKNA", "SAKNA", "RAKNA"], "Kata dengan huruf M, arti dari sebuah kata"),
    entry!("h-mn-2", Hard, MN, "N", "NIAGA", ["MIAGA", "SIAGA", "TIAGA"], "Kata dengan huruf N, kegiatan jual beli"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_has_candidates_at_every_difficulty() {
        for pair in LetterPair::ALL {
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                assert!(
                    !candidates(pair, difficulty).is_empty(),
                    "no candidates for {pair} at {difficulty}"
                );
            }
        }
    }

    #[test]
    fn entries_have_unique_ids_and_disjoint_words() {
        let mut ids = std::collections::HashSet::new();
        for e in WORD_BANK {
            assert!(ids.insert(e.template_id), "duplicate id {}", e.template_id);
            for d in e.distractors {
                assert_ne!(d, e.correct_word, "distractor equals answer in {}", e.template_id);
            }
        }
    }
}
