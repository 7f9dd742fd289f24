use crate::domain::model::{Element, ElementScore, ZodiacSign};

/// 元素配對基礎分數，列/欄順序為 Fire, Earth, Air, Water
pub const ELEMENT_SCORES: [[f64; 4]; 4] = [
    [85.0, 55.0, 80.0, 45.0],
    [55.0, 85.0, 50.0, 90.0],
    [80.0, 50.0, 85.0, 55.0],
    [45.0, 90.0, 55.0, 85.0],
];

/// 星座配對修正值 (-20..=20)，依 (row, column) 有序配對定義，刻意不對稱。
/// 使用時取雙向平均。對角線為 0。
pub const SIGN_MODIFIERS: [[i8; 12]; 12] = [
    [0, -3, 9, -11, 14, -8, 5, -9, 12, -7, 5, -1],
    [-1, 0, -2, 3, -10, 15, -7, 6, -8, 13, -13, 6],
    [6, 0, 0, -1, 4, -9, 9, -6, 7, -7, 14, -12],
    [-12, 7, -6, 0, 0, 5, -8, 10, -5, 1, -6, 15],
    [15, -11, 8, -5, 0, -6, 6, -7, 11, -4, 2, -5],
    [-5, 9, -10, 9, -4, 0, -5, 7, -13, 12, -3, 3],
    [3, -4, 10, -9, 3, -3, 0, -4, 8, -12, 13, -9],
    [-9, 4, -3, 11, -8, 4, -2, 0, -3, 9, -11, 14],
    [14, -8, 5, -9, 12, -7, 5, -1, 0, -2, 3, -10],
    [-10, 15, -7, 6, -8, 13, -13, 6, 0, 0, -1, 4],
    [4, -9, 9, -6, 7, -7, 14, -12, 7, -6, 0, 0],
    [0, 5, -8, 10, -5, 1, -6, 15, -11, 8, -5, 0],
];

pub fn element_base_score(a: Element, b: Element) -> f64 {
    ELEMENT_SCORES[a.index()][b.index()]
}

/// 雙向平均後的修正值，因此對稱
pub fn sign_modifier(a: ZodiacSign, b: ZodiacSign) -> f64 {
    let forward = SIGN_MODIFIERS[a.index()][b.index()] as f64;
    let backward = SIGN_MODIFIERS[b.index()][a.index()] as f64;
    (forward + backward) / 2.0
}

/// 查詢兩個星座的元素相容度
pub fn element_compatibility(sign1: ZodiacSign, sign2: ZodiacSign) -> ElementScore {
    let element1 = sign1.element();
    let element2 = sign2.element();
    let base_score = element_base_score(element1, element2);
    let modifier = sign_modifier(sign1, sign2);

    ElementScore {
        sign1,
        sign2,
        element1,
        element2,
        base_score,
        sign_modifier: modifier,
        score: (base_score + modifier).clamp(0.0, 100.0),
    }
}
