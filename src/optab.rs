//! Fixed 100-slot bucket table mapping a uniform draw to an operation kind.

/// A single request kind, shared between the [`OpTab`] bucket contents and a
/// client's in-flight request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Idle,
    Get,
    Set,
    Del,
    LPush,
    LPop,
    HSet,
    HGet,
    HGetAll,
    SwapIn,
}

/// The configured mix, as raw percentages.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpPercentages {
    pub set: u8,
    pub del: u8,
    pub lpush: u8,
    pub lpop: u8,
    pub hset: u8,
    pub hget: u8,
    pub hgetall: u8,
    pub swapin: u8,
}

const SLOTS: usize = 100;

/// The fixed bucket table: `sample()` turns a `[0, 100)` draw into an [`Op`].
pub struct OpTab {
    slots: [Op; SLOTS],
}

impl OpTab {
    /// Fill every slot with [`Op::Idle`], used when the benchmark is run in
    /// idle-connection mode, where no request is ever issued.
    pub fn idle() -> Self {
        OpTab {
            slots: [Op::Idle; SLOTS],
        }
    }

    /// Build the table from configured percentages.
    ///
    /// All slots start as GET, then SET/DEL/LPUSH/LPOP/HSET/HGET/HGETALL/
    /// SWAPIN each overwrite a run of consecutive slots in that order,
    /// starting where the previous op's run left off. If the percentages
    /// sum past 100, the remaining ops are silently truncated rather than
    /// rejected or normalized.
    pub fn build(perc: OpPercentages) -> Self {
        let mut slots = [Op::Get; SLOTS];
        let mut cursor = 0usize;
        for (op, pct) in [
            (Op::Set, perc.set),
            (Op::Del, perc.del),
            (Op::LPush, perc.lpush),
            (Op::LPop, perc.lpop),
            (Op::HSet, perc.hset),
            (Op::HGet, perc.hget),
            (Op::HGetAll, perc.hgetall),
            (Op::SwapIn, perc.swapin),
        ] {
            let take = (pct as usize).min(SLOTS.saturating_sub(cursor));
            for slot in &mut slots[cursor..cursor + take] {
                *slot = op;
            }
            cursor += take;
            if cursor >= SLOTS {
                break;
            }
        }
        OpTab { slots }
    }

    /// Look up the op for bucket `b` (`b` should be in `[0, 100)`; larger
    /// values are taken modulo 100).
    pub fn sample(&self, b: u64) -> Op {
        self.slots[(b as usize) % SLOTS]
    }

    /// Count how many buckets are assigned to a given op, used by tests to
    /// check table fidelity.
    #[cfg(test)]
    pub fn count(&self, op: Op) -> usize {
        self.slots.iter().filter(|&&s| s == op).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_get_by_default() {
        let tab = OpTab::build(OpPercentages::default());
        assert_eq!(tab.count(Op::Get), 100);
    }

    #[test]
    fn percentages_match_bucket_counts() {
        let perc = OpPercentages {
            set: 20,
            del: 5,
            ..Default::default()
        };
        let tab = OpTab::build(perc);
        assert_eq!(tab.count(Op::Set), 20);
        assert_eq!(tab.count(Op::Del), 5);
        assert_eq!(tab.count(Op::Get), 75);
    }

    #[test]
    fn overflow_is_truncated_silently() {
        // set+del alone already exceed 100; lpush never gets a slot.
        let perc = OpPercentages {
            set: 60,
            del: 50,
            lpush: 10,
            ..Default::default()
        };
        let tab = OpTab::build(perc);
        assert_eq!(tab.count(Op::Set), 60);
        assert_eq!(tab.count(Op::Del), 40);
        assert_eq!(tab.count(Op::LPush), 0);
        assert_eq!(tab.count(Op::Get), 0);
    }

    #[test]
    fn idle_table_is_all_idle() {
        let tab = OpTab::idle();
        assert_eq!(tab.count(Op::Idle), 100);
    }

    #[test]
    fn sample_wraps_bucket_index() {
        let tab = OpTab::build(OpPercentages {
            set: 100,
            ..Default::default()
        });
        assert_eq!(tab.sample(0), Op::Set);
        assert_eq!(tab.sample(199), Op::Set);
    }
}
