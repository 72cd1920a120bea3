//! The table: an ordered, duplicate-free set of rows keyed by id.
//!
//! The tree is currently one leaf page that doubles as the root. All key
//! lookups go through [`Table::route`], which is where internal-node descent
//! plugs in once leaves can split.

use std::path::Path;

use tracing::{debug, trace, warn};

use crate::node::{LeafNode, NodeType, node_type};
use crate::{Config, DbError, Pager, Result, Row};

pub struct Table {
    pager: Pager,
    root_page_num: u32,
}

impl Table {
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let mut pager = Pager::open(path, config.max_pages)?;
        let root_page_num = 0;

        if pager.num_pages() == 0 {
            let page_num = pager.allocate_page()?;
            LeafNode::new(pager.get_page_mut(page_num)?).initialize(true);
            debug!(page = page_num, "initialized empty root leaf");
        } else {
            let root = LeafNode::new(pager.get_page(root_page_num)?);
            root.check().map_err(|reason| DbError::CorruptPage {
                page: root_page_num,
                reason,
            })?;
            if !root.is_root() {
                return Err(DbError::CorruptPage {
                    page: root_page_num,
                    reason: "root flag not set",
                });
            }
        }

        Ok(Self {
            pager,
            root_page_num,
        })
    }

    pub fn close(self) -> Result<()> {
        self.pager.close()
    }

    pub fn page_count(&self) -> u32 {
        self.pager.num_pages()
    }

    /// The leaf page that holds, or would hold, `key`.
    pub fn route(&mut self, _key: u32) -> Result<u32> {
        let page_num = self.root_page_num;
        match node_type(self.pager.get_page(page_num)?) {
            Ok(NodeType::Leaf) => Ok(page_num),
            Ok(NodeType::Internal) => Err(DbError::CorruptPage {
                page: page_num,
                reason: "internal nodes are not supported",
            }),
            Err(_) => Err(DbError::CorruptPage {
                page: page_num,
                reason: "unknown node type",
            }),
        }
    }

    /// Inserts `row` keyed by its id. Fails without touching the page on an
    /// invalid row, an existing key or a full leaf.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let value = row.serialize()?;
        let key = row.key();
        let page_num = self.route(key)?;

        let leaf = LeafNode::new(self.pager.get_page(page_num)?);
        let position = leaf.find_position(key);
        if position < leaf.num_cells() && leaf.key(position) == key {
            return Err(DbError::DuplicateKey(key));
        }
        if leaf.is_full() {
            warn!(page = page_num, key, "leaf is full, rejecting insert");
            return Err(DbError::TableFull);
        }

        LeafNode::new(self.pager.get_page_mut(page_num)?).insert_cell(position, key, &value);
        trace!(page = page_num, key, position, "inserted cell");
        Ok(())
    }

    pub fn find(&mut self, key: u32) -> Result<Option<Row>> {
        let page_num = self.route(key)?;
        let leaf = LeafNode::new(self.pager.get_page(page_num)?);
        let position = leaf.find_position(key);
        if position < leaf.num_cells() && leaf.key(position) == key {
            Ok(Some(Row::deserialize(leaf.value(position))))
        } else {
            Ok(None)
        }
    }

    /// A cursor over every row in ascending key order.
    pub fn scan(&mut self) -> Cursor<'_> {
        Cursor {
            page_num: self.root_page_num,
            cell_num: 0,
            done: false,
            table: self,
        }
    }

    /// Renders the tree for the `.btree` meta-command.
    pub fn dump(&mut self) -> Result<String> {
        let mut out = String::new();
        self.dump_node(self.root_page_num, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(&mut self, page_num: u32, depth: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(depth);
        let page = self.pager.get_page(page_num)?;
        match node_type(page) {
            Ok(NodeType::Leaf) => {
                let leaf = LeafNode::new(page);
                out.push_str(&format!("{indent}leaf (size {})\n", leaf.num_cells()));
                for i in 0..leaf.num_cells() {
                    out.push_str(&format!("{indent}  - {i} : {}\n", leaf.key(i)));
                }
                Ok(())
            }
            _ => Err(DbError::CorruptPage {
                page: page_num,
                reason: "expected a leaf node",
            }),
        }
    }
}

/// In-order iterator over the table. Holds a position, never a page.
pub struct Cursor<'a> {
    table: &'a mut Table,
    page_num: u32,
    cell_num: usize,
    done: bool,
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let page = match self.table.pager.get_page(self.page_num) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let leaf = LeafNode::new(page);
        if self.cell_num >= leaf.num_cells() {
            // Single leaf: nothing to the right.
            self.done = true;
            return None;
        }

        let row = Row::deserialize(leaf.value(self.cell_num));
        self.cell_num += 1;
        Some(Ok(row))
    }
}
