use crate::model::Board;

impl Board {
    /// Cheap structural digest of column ids, archive flags and task ids.
    ///
    /// Two boards with the same fingerprint have the same shape; field edits
    /// inside a task do not change it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (index, column) in self.columns.iter().enumerate() {
            if index > 0 {
                out.push('|');
            }
            out.push_str(column.id.as_str());
            out.push_str(if column.archived { ":A[" } else { ":[" });
            for (position, task) in column.tasks.iter().enumerate() {
                if position > 0 {
                    out.push(',');
                }
                out.push_str(task.id.as_str());
            }
            out.push(']');
        }
        out
    }
}
