use serde::{Deserialize, Serialize};

/// 列表页的 `?page=` 参数；非数字的值按第一页处理
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// 固定页大小的分页器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

/// 解析后的页窗口，用于生成 LIMIT/OFFSET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }
}

/// 一页数据及其元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// 总页数；空列表也有一页
    pub fn num_pages(&self, count: usize) -> usize {
        if count == 0 {
            1
        } else {
            (count + self.per_page - 1) / self.per_page
        }
    }

    /// 把请求的页码收敛到合法范围：缺省或非数字取第一页，越界取最后一页
    pub fn window(&self, requested: Option<&str>, count: usize) -> PageWindow {
        let num_pages = self.num_pages(count);
        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 && (n as usize) <= num_pages => n as usize,
                Ok(_) => num_pages,
                Err(_) => 1,
            },
        };

        PageWindow {
            number,
            num_pages,
            count,
            per_page: self.per_page,
        }
    }

    /// 对已经排好序的完整序列分页
    pub fn page<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let window = self.window(requested, items.len());
        let end = (window.offset() + window.limit()).min(items.len());
        let slice = items
            .get(window.offset()..end)
            .map(|s| s.to_vec())
            .unwrap_or_default();
        Page::from_window(slice, window)
    }
}

impl<T> Page<T> {
    pub fn from_window(object_list: Vec<T>, window: PageWindow) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        Self {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
        }
    }
}
