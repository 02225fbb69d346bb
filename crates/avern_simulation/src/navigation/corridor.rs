//! Polygon corridor: ограниченный список полигонов, который смузер
//! мутирует на месте (fixup по visited, shortcut через соседей, прыжок через off-mesh).

use super::query::{NavMeshQuery, PolyRef};

/// Сколько полигонов вперёд смотрит shortcut pass
pub const SHORTCUT_LOOK_AHEAD: usize = 6;

/// Сколько соседей текущего полигона учитывается при shortcut
const MAX_SHORTCUT_NEIGHBOURS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corridor {
    polys: Vec<PolyRef>,
    max_len: usize,
}

impl Corridor {
    pub fn new(mut polys: Vec<PolyRef>, max_len: usize) -> Self {
        polys.truncate(max_len);
        Self { polys, max_len }
    }

    pub fn polys(&self) -> &[PolyRef] {
        &self.polys
    }

    pub fn first(&self) -> Option<PolyRef> {
        self.polys.first().copied()
    }

    pub fn len(&self) -> usize {
        self.polys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Склеивает коридор с полигонами, реально пройденными `move_along_surface`
    ///
    /// Ищется самый дальний полигон коридора, встречающийся в `visited`.
    /// Начало коридора заменяется на пройденный хвост (в обратном порядке,
    /// текущий полигон первым), остаток коридора после общего полигона сохраняется.
    /// Без пересечения коридор не меняется (возвращает false).
    pub fn fixup(&mut self, visited: &[PolyRef]) -> bool {
        let furthest = (0..self.polys.len())
            .rev()
            .find_map(|i| visited.iter().position(|v| *v == self.polys[i]).map(|j| (i, j)));
        let Some((furthest_path, furthest_visited)) = furthest else {
            return false;
        };

        let required = visited.len() - furthest_visited;
        let original = (furthest_path + 1).min(self.polys.len());
        let mut size = self.polys.len().saturating_sub(original);
        if required + size > self.max_len {
            size = self.max_len.saturating_sub(required);
        }

        let mut merged = Vec::with_capacity(required + size);
        merged.extend(visited[furthest_visited..].iter().rev().copied());
        merged.extend_from_slice(&self.polys[original..original + size]);
        merged.truncate(self.max_len);

        self.polys = merged;
        true
    }

    /// Shortcut: если один из ближайших `SHORTCUT_LOOK_AHEAD` полигонов является прямым соседом
    /// текущего, промежуточные полигоны выкидываются
    ///
    /// Берётся самый дальний такой сосед (индекс > 1). Ошибка запроса соседей
    /// оставляет коридор как есть.
    pub fn fixup_shortcuts(&mut self, query: &dyn NavMeshQuery) {
        if self.polys.len() < 3 {
            return;
        }
        let Ok(mut neighbours) = query.neighbours(self.polys[0]) else {
            return;
        };
        neighbours.truncate(MAX_SHORTCUT_NEIGHBOURS);

        let look_ahead = SHORTCUT_LOOK_AHEAD.min(self.polys.len());
        let cut = (2..look_ahead)
            .rev()
            .find(|&i| neighbours.contains(&self.polys[i]));

        if let Some(cut) = cut {
            self.polys.drain(1..cut);
        }
    }

    /// Продвигает коридор за off-mesh connection
    ///
    /// Удаляет полигоны до connection включительно и возвращает полигон перед ней
    /// (нужен, чтобы узнать направление прохождения). Если connection нет в коридоре,
    /// коридор опустошается. Connection в голове коридора не сдвигается (None).
    pub fn advance_past_off_mesh(&mut self, connection: PolyRef) -> Option<PolyRef> {
        let mut current = self.first()?;
        let mut prev = None;
        let mut consumed = 0;
        while consumed < self.polys.len() && current != connection {
            prev = Some(current);
            current = self.polys[consumed];
            consumed += 1;
        }

        self.polys.drain(..consumed);
        if current == connection {
            prev
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::query::{MockNavMeshQuery, NavQueryError};
    use rstest::rstest;

    fn refs(ids: &[u32]) -> Vec<PolyRef> {
        ids.iter().copied().map(PolyRef).collect()
    }

    #[rstest]
    #[case::moved_forward(&[0, 1, 2], &[0, 1], &[1, 2])]
    #[case::stayed(&[0, 1, 2], &[0], &[0, 1, 2])]
    #[case::backtracked(&[0, 1, 3], &[0, 1, 2], &[2, 1, 3])]
    #[case::skipped_ahead(&[0, 1, 2, 3, 4], &[0, 1, 2, 3], &[3, 4])]
    #[case::no_overlap(&[0, 1, 2], &[7, 8], &[0, 1, 2])]
    fn test_fixup_merges_visited(#[case] path: &[u32], #[case] visited: &[u32], #[case] expected: &[u32]) {
        let mut corridor = Corridor::new(refs(path), 256);
        corridor.fixup(&refs(visited));
        assert_eq!(corridor.polys(), refs(expected).as_slice());
    }

    #[test]
    fn test_fixup_never_exceeds_max_len() {
        let mut corridor = Corridor::new(refs(&[0, 1, 2, 3, 4]), 5);
        // Ушли с полигона 1 в сторону → начало коридора растёт, хвост режется
        assert!(corridor.fixup(&refs(&[1, 9, 8, 7])));
        assert_eq!(corridor.polys(), refs(&[7, 8, 9, 1, 2]).as_slice());

        let mut tiny = Corridor::new(refs(&[0, 1, 2]), 2);
        assert_eq!(tiny.len(), 2);
        tiny.fixup(&refs(&[1, 5, 6]));
        assert_eq!(tiny.polys(), refs(&[6, 5]).as_slice());
    }

    #[test]
    fn test_shortcut_removes_skipped_polygons() {
        let mut query = MockNavMeshQuery::new();
        query
            .expect_neighbours()
            .returning(|_| Ok(vec![PolyRef(1), PolyRef(3)]));

        let mut corridor = Corridor::new(refs(&[0, 1, 2, 3, 4]), 256);
        corridor.fixup_shortcuts(&query);

        assert_eq!(corridor.polys(), refs(&[0, 3, 4]).as_slice());
        // После shortcut соседей текущего полигона дальше индекса 1 нет
        assert!(corridor.polys()[2..].iter().all(|p| *p != PolyRef(1) && *p != PolyRef(3)));
    }

    #[test]
    fn test_shortcut_look_ahead_is_bounded() {
        let mut query = MockNavMeshQuery::new();
        query.expect_neighbours().returning(|_| Ok(vec![PolyRef(6)]));

        let mut corridor = Corridor::new(refs(&[0, 1, 2, 3, 4, 5, 6]), 256);
        corridor.fixup_shortcuts(&query);

        assert_eq!(corridor.len(), 7);
    }

    #[test]
    fn test_shortcut_keeps_corridor_on_query_error() {
        let mut query = MockNavMeshQuery::new();
        query
            .expect_neighbours()
            .returning(|poly| Err(NavQueryError::InvalidPolyRef(poly)));

        let mut corridor = Corridor::new(refs(&[0, 1, 2, 3]), 256);
        corridor.fixup_shortcuts(&query);
        assert_eq!(corridor.polys(), refs(&[0, 1, 2, 3]).as_slice());

        let mut short = Corridor::new(refs(&[0, 1]), 256);
        short.fixup_shortcuts(&query);
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_advance_past_off_mesh_connection() {
        let mut corridor = Corridor::new(refs(&[0, 1, 9, 2]), 256);
        assert_eq!(corridor.advance_past_off_mesh(PolyRef(9)), Some(PolyRef(1)));
        assert_eq!(corridor.polys(), refs(&[2]).as_slice());

        let mut missing = Corridor::new(refs(&[0, 1, 2]), 256);
        assert_eq!(missing.advance_past_off_mesh(PolyRef(9)), None);
        assert!(missing.is_empty());

        let mut at_head = Corridor::new(refs(&[9, 2]), 256);
        assert_eq!(at_head.advance_past_off_mesh(PolyRef(9)), None);
        assert_eq!(at_head.len(), 2);
    }
}
