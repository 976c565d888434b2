//! The 72 melakarta ragas in canonical order
//!
//! Scale degrees are semitone offsets from Sa. Entries are append-only and the
//! order matters: matching breaks ties by position.

use super::Raga;

pub static MELAKARTA: [Raga; 72] = [
    Raga::new(1, "Kanakangi", [0, 1, 2, 5, 7, 8, 9], "S R1 G1 M1 P D1 N1 S", "S N1 D1 P M1 G1 R1 S"),
    Raga::new(2, "Ratnangi", [0, 1, 2, 5, 7, 8, 10], "S R1 G1 M1 P D1 N2 S", "S N2 D1 P M1 G1 R1 S"),
    Raga::new(3, "Ganamurti", [0, 1, 2, 5, 7, 8, 11], "S R1 G1 M1 P D1 N3 S", "S N3 D1 P M1 G1 R1 S"),
    Raga::new(4, "Vanaspati", [0, 1, 2, 5, 7, 9, 10], "S R1 G1 M1 P D2 N2 S", "S N2 D2 P M1 G1 R1 S"),
    Raga::new(5, "Manavati", [0, 1, 2, 5, 7, 9, 11], "S R1 G1 M1 P D2 N3 S", "S N3 D2 P M1 G1 R1 S"),
    Raga::new(6, "Tanarupi", [0, 1, 2, 5, 7, 10, 11], "S R1 G1 M1 P D3 N3 S", "S N3 D3 P M1 G1 R1 S"),
    Raga::new(7, "Senavati", [0, 1, 3, 5, 7, 8, 9], "S R1 G2 M1 P D1 N1 S", "S N1 D1 P M1 G2 R1 S"),
    Raga::new(8, "Hanumatodi", [0, 1, 3, 5, 7, 8, 10], "S R1 G2 M1 P D1 N2 S", "S N2 D1 P M1 G2 R1 S"),
    Raga::new(9, "Dhenuka", [0, 1, 3, 5, 7, 8, 11], "S R1 G2 M1 P D1 N3 S", "S N3 D1 P M1 G2 R1 S"),
    Raga::new(10, "Natakapriya", [0, 1, 3, 5, 7, 9, 10], "S R1 G2 M1 P D2 N2 S", "S N2 D2 P M1 G2 R1 S"),
    Raga::new(11, "Kokilapriya", [0, 1, 3, 5, 7, 9, 11], "S R1 G2 M1 P D2 N3 S", "S N3 D2 P M1 G2 R1 S"),
    Raga::new(12, "Rupavati", [0, 1, 3, 5, 7, 10, 11], "S R1 G2 M1 P D3 N3 S", "S N3 D3 P M1 G2 R1 S"),
    Raga::new(13, "Gayakapriya", [0, 1, 4, 5, 7, 8, 9], "S R1 G3 M1 P D1 N1 S", "S N1 D1 P M1 G3 R1 S"),
    Raga::new(14, "Vakulabharanam", [0, 1, 4, 5, 7, 8, 10], "S R1 G3 M1 P D1 N2 S", "S N2 D1 P M1 G3 R1 S"),
    Raga::new(15, "Mayamalavagowla", [0, 1, 4, 5, 7, 8, 11], "S R1 G3 M1 P D1 N3 S", "S N3 D1 P M1 G3 R1 S"),
    Raga::new(16, "Chakravakam", [0, 1, 4, 5, 7, 9, 10], "S R1 G3 M1 P D2 N2 S", "S N2 D2 P M1 G3 R1 S"),
    Raga::new(17, "Suryakantam", [0, 1, 4, 5, 7, 9, 11], "S R1 G3 M1 P D2 N3 S", "S N3 D2 P M1 G3 R1 S"),
    Raga::new(18, "Hatakambari", [0, 1, 4, 5, 7, 10, 11], "S R1 G3 M1 P D3 N3 S", "S N3 D3 P M1 G3 R1 S"),
    Raga::new(19, "Jhankaradhvani", [0, 2, 3, 5, 7, 8, 9], "S R2 G2 M1 P D1 N1 S", "S N1 D1 P M1 G2 R2 S"),
    Raga::new(20, "Natabhairavi", [0, 2, 3, 5, 7, 8, 10], "S R2 G2 M1 P D1 N2 S", "S N2 D1 P M1 G2 R2 S"),
    Raga::new(21, "Keeravani", [0, 2, 3, 5, 7, 8, 11], "S R2 G2 M1 P D1 N3 S", "S N3 D1 P M1 G2 R2 S"),
    Raga::new(22, "Kharaharapriya", [0, 2, 3, 5, 7, 9, 10], "S R2 G2 M1 P D2 N2 S", "S N2 D2 P M1 G2 R2 S"),
    Raga::new(23, "Gourimanohari", [0, 2, 3, 5, 7, 9, 11], "S R2 G2 M1 P D2 N3 S", "S N3 D2 P M1 G2 R2 S"),
    Raga::new(24, "Varunapriya", [0, 2, 3, 5, 7, 10, 11], "S R2 G2 M1 P D3 N3 S", "S N3 D3 P M1 G2 R2 S"),
    Raga::new(25, "Mararanjani", [0, 2, 4, 5, 7, 8, 9], "S R2 G3 M1 P D1 N1 S", "S N1 D1 P M1 G3 R2 S"),
    Raga::new(26, "Charukesi", [0, 2, 4, 5, 7, 8, 10], "S R2 G3 M1 P D1 N2 S", "S N2 D1 P M1 G3 R2 S"),
    Raga::new(27, "Sarasangi", [0, 2, 4, 5, 7, 8, 11], "S R2 G3 M1 P D1 N3 S", "S N3 D1 P M1 G3 R2 S"),
    Raga::new(28, "Harikambhoji", [0, 2, 4, 5, 7, 9, 10], "S R2 G3 M1 P D2 N2 S", "S N2 D2 P M1 G3 R2 S"),
    Raga::new(29, "Dheerasankarabharanam", [0, 2, 4, 5, 7, 9, 11], "S R2 G3 M1 P D2 N3 S", "S N3 D2 P M1 G3 R2 S"),
    Raga::new(30, "Naganandini", [0, 2, 4, 5, 7, 10, 11], "S R2 G3 M1 P D3 N3 S", "S N3 D3 P M1 G3 R2 S"),
    Raga::new(31, "Yagapriya", [0, 3, 4, 5, 7, 8, 9], "S R3 G3 M1 P D1 N1 S", "S N1 D1 P M1 G3 R3 S"),
    Raga::new(32, "Ragavardhini", [0, 3, 4, 5, 7, 8, 10], "S R3 G3 M1 P D1 N2 S", "S N2 D1 P M1 G3 R3 S"),
    Raga::new(33, "Gangeyabhushani", [0, 3, 4, 5, 7, 8, 11], "S R3 G3 M1 P D1 N3 S", "S N3 D1 P M1 G3 R3 S"),
    Raga::new(34, "Vagadheeswari", [0, 3, 4, 5, 7, 9, 10], "S R3 G3 M1 P D2 N2 S", "S N2 D2 P M1 G3 R3 S"),
    Raga::new(35, "Shulini", [0, 3, 4, 5, 7, 9, 11], "S R3 G3 M1 P D2 N3 S", "S N3 D2 P M1 G3 R3 S"),
    Raga::new(36, "Chalanata", [0, 3, 4, 5, 7, 10, 11], "S R3 G3 M1 P D3 N3 S", "S N3 D3 P M1 G3 R3 S"),
    Raga::new(37, "Salagam", [0, 1, 2, 6, 7, 8, 9], "S R1 G1 M2 P D1 N1 S", "S N1 D1 P M2 G1 R1 S"),
    Raga::new(38, "Jalarnavam", [0, 1, 2, 6, 7, 8, 10], "S R1 G1 M2 P D1 N2 S", "S N2 D1 P M2 G1 R1 S"),
    Raga::new(39, "Jhalavarali", [0, 1, 2, 6, 7, 8, 11], "S R1 G1 M2 P D1 N3 S", "S N3 D1 P M2 G1 R1 S"),
    Raga::new(40, "Navaneetam", [0, 1, 2, 6, 7, 9, 10], "S R1 G1 M2 P D2 N2 S", "S N2 D2 P M2 G1 R1 S"),
    Raga::new(41, "Pavani", [0, 1, 2, 6, 7, 9, 11], "S R1 G1 M2 P D2 N3 S", "S N3 D2 P M2 G1 R1 S"),
    Raga::new(42, "Raghupriya", [0, 1, 2, 6, 7, 10, 11], "S R1 G1 M2 P D3 N3 S", "S N3 D3 P M2 G1 R1 S"),
    Raga::new(43, "Gavambodhi", [0, 1, 3, 6, 7, 8, 9], "S R1 G2 M2 P D1 N1 S", "S N1 D1 P M2 G2 R1 S"),
    Raga::new(44, "Bhavapriya", [0, 1, 3, 6, 7, 8, 10], "S R1 G2 M2 P D1 N2 S", "S N2 D1 P M2 G2 R1 S"),
    Raga::new(45, "Shubhapantuvarali", [0, 1, 3, 6, 7, 8, 11], "S R1 G2 M2 P D1 N3 S", "S N3 D1 P M2 G2 R1 S"),
    Raga::new(46, "Shadvidamargini", [0, 1, 3, 6, 7, 9, 10], "S R1 G2 M2 P D2 N2 S", "S N2 D2 P M2 G2 R1 S"),
    Raga::new(47, "Suvarnangi", [0, 1, 3, 6, 7, 9, 11], "S R1 G2 M2 P D2 N3 S", "S N3 D2 P M2 G2 R1 S"),
    Raga::new(48, "Divyamani", [0, 1, 3, 6, 7, 10, 11], "S R1 G2 M2 P D3 N3 S", "S N3 D3 P M2 G2 R1 S"),
    Raga::new(49, "Dhavalambari", [0, 1, 4, 6, 7, 8, 9], "S R1 G3 M2 P D1 N1 S", "S N1 D1 P M2 G3 R1 S"),
    Raga::new(50, "Namanarayani", [0, 1, 4, 6, 7, 8, 10], "S R1 G3 M2 P D1 N2 S", "S N2 D1 P M2 G3 R1 S"),
    Raga::new(51, "Kamavardhani", [0, 1, 4, 6, 7, 8, 11], "S R1 G3 M2 P D1 N3 S", "S N3 D1 P M2 G3 R1 S"),
    Raga::new(52, "Ramapriya", [0, 1, 4, 6, 7, 9, 10], "S R1 G3 M2 P D2 N2 S", "S N2 D2 P M2 G3 R1 S"),
    Raga::new(53, "Gamanashrama", [0, 1, 4, 6, 7, 9, 11], "S R1 G3 M2 P D2 N3 S", "S N3 D2 P M2 G3 R1 S"),
    Raga::new(54, "Vishwambari", [0, 1, 4, 6, 7, 10, 11], "S R1 G3 M2 P D3 N3 S", "S N3 D3 P M2 G3 R1 S"),
    Raga::new(55, "Syamalangi", [0, 2, 3, 6, 7, 8, 9], "S R2 G2 M2 P D1 N1 S", "S N1 D1 P M2 G2 R2 S"),
    Raga::new(56, "Shanmukhapriya", [0, 2, 3, 6, 7, 8, 10], "S R2 G2 M2 P D1 N2 S", "S N2 D1 P M2 G2 R2 S"),
    Raga::new(57, "Simhendramadhyamam", [0, 2, 3, 6, 7, 8, 11], "S R2 G2 M2 P D1 N3 S", "S N3 D1 P M2 G2 R2 S"),
    Raga::new(58, "Hemavati", [0, 2, 3, 6, 7, 9, 10], "S R2 G2 M2 P D2 N2 S", "S N2 D2 P M2 G2 R2 S"),
    Raga::new(59, "Dharmavati", [0, 2, 3, 6, 7, 9, 11], "S R2 G2 M2 P D2 N3 S", "S N3 D2 P M2 G2 R2 S"),
    Raga::new(60, "Neetimati", [0, 2, 3, 6, 7, 10, 11], "S R2 G2 M2 P D3 N3 S", "S N3 D3 P M2 G2 R2 S"),
    Raga::new(61, "Kantamani", [0, 2, 4, 6, 7, 8, 9], "S R2 G3 M2 P D1 N1 S", "S N1 D1 P M2 G3 R2 S"),
    Raga::new(62, "Rishabhapriya", [0, 2, 4, 6, 7, 8, 10], "S R2 G3 M2 P D1 N2 S", "S N2 D1 P M2 G3 R2 S"),
    Raga::new(63, "Latangi", [0, 2, 4, 6, 7, 8, 11], "S R2 G3 M2 P D1 N3 S", "S N3 D1 P M2 G3 R2 S"),
    Raga::new(64, "Vachaspati", [0, 2, 4, 6, 7, 9, 10], "S R2 G3 M2 P D2 N2 S", "S N2 D2 P M2 G3 R2 S"),
    Raga::new(65, "Mechakalyani", [0, 2, 4, 6, 7, 9, 11], "S R2 G3 M2 P D2 N3 S", "S N3 D2 P M2 G3 R2 S"),
    Raga::new(66, "Chitrambari", [0, 2, 4, 6, 7, 10, 11], "S R2 G3 M2 P D3 N3 S", "S N3 D3 P M2 G3 R2 S"),
    Raga::new(67, "Sucharitra", [0, 3, 4, 6, 7, 8, 9], "S R3 G3 M2 P D1 N1 S", "S N1 D1 P M2 G3 R3 S"),
    Raga::new(68, "Jyoti Swarupini", [0, 3, 4, 6, 7, 8, 10], "S R3 G3 M2 P D1 N2 S", "S N2 D1 P M2 G3 R3 S"),
    Raga::new(69, "Dhatuvardhani", [0, 3, 4, 6, 7, 8, 11], "S R3 G3 M2 P D1 N3 S", "S N3 D1 P M2 G3 R3 S"),
    Raga::new(70, "Nasikabhushani", [0, 3, 4, 6, 7, 9, 10], "S R3 G3 M2 P D2 N2 S", "S N2 D2 P M2 G3 R3 S"),
    Raga::new(71, "Kosalam", [0, 3, 4, 6, 7, 9, 11], "S R3 G3 M2 P D2 N3 S", "S N3 D2 P M2 G3 R3 S"),
    Raga::new(72, "Rasikapriya", [0, 3, 4, 6, 7, 10, 11], "S R3 G3 M2 P D3 N3 S", "S N3 D3 P M2 G3 R3 S"),
];
